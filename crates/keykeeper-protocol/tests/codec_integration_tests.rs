//! Integration tests for ConsoleCodec with Tokio streams.
//!
//! A duplex pipe stands in for the serial port: the "device" side writes raw
//! console bytes, the host side reads decoded lines through `Framed`.

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio_util::codec::{Framed, FramedRead};
use keykeeper_protocol::{ConsoleCodec, ConsoleCommand, ConsoleEvent, classify};

fn console_pipe(buffer_size: usize) -> (Framed<DuplexStream, ConsoleCodec>, DuplexStream) {
    let (host, device) = tokio::io::duplex(buffer_size);
    (Framed::new(host, ConsoleCodec::new()), device)
}

#[tokio::test]
async fn test_commands_reach_device_with_crlf() {
    let (mut host, mut device) = console_pipe(1024);

    host.send(ConsoleCommand::Blank).await.unwrap();
    host.send(ConsoleCommand::BleStart).await.unwrap();

    let mut received = vec![0u8; 13];
    device.read_exact(&mut received).await.unwrap();
    assert_eq!(received, b"\r\nble_start\r\n");
}

#[tokio::test]
async fn test_colored_log_stream_is_classified() {
    let (mut host, mut device) = console_pipe(4096);

    device
        .write_all(
            b"\x1b[1;32m[00:00:10.000,000] <inf> app: Connected: [C4:8B:42:80:CC:CA]\x1b[0m\r\n\
              \x1b[1;32m[00:00:10.500,000] <inf> app: Battery Level: 64%\x1b[0m\r\n",
        )
        .await
        .unwrap();

    let first = host.next().await.unwrap().unwrap();
    assert!(!first.contains('\x1b'));
    assert_eq!(
        classify(&first),
        ConsoleEvent::Connected {
            address: "C4:8B:42:80:CC:CA".to_string()
        }
    );

    let second = host.next().await.unwrap().unwrap();
    assert_eq!(classify(&second), ConsoleEvent::BatteryLevel { percent: 64 });
}

#[tokio::test]
async fn test_line_split_across_writes() {
    let (mut host, mut device) = console_pipe(64);

    tokio::spawn(async move {
        for chunk in [&b"<inf> app: KEY AUTHEN"[..], b"TICATED. OPEN ", b"DOOR PLEASE.\r\n"] {
            device.write_all(chunk).await.unwrap();
            tokio::task::yield_now().await;
        }
    });

    let line = host.next().await.unwrap().unwrap();
    assert_eq!(classify(&line), ConsoleEvent::Authenticated);
}

#[tokio::test]
async fn test_stream_ends_when_device_disappears() {
    let (host, mut device) = tokio::io::duplex(256);
    let mut lines = FramedRead::new(host, ConsoleCodec::new());

    device.write_all(b"done\r\npartial").await.unwrap();
    drop(device);

    assert_eq!(lines.next().await.unwrap().unwrap(), "done");
    assert_eq!(lines.next().await.unwrap().unwrap(), "partial");
    assert!(lines.next().await.is_none());
}

#[tokio::test]
async fn test_garbage_bytes_do_not_break_stream() {
    let (mut host, mut device) = console_pipe(1024);

    device.write_all(b"\xff\xfe\x00garbage\r\ndone\r\n").await.unwrap();

    let noise = host.next().await.unwrap().unwrap();
    assert_eq!(classify(&noise), ConsoleEvent::Unrecognized);
    assert_eq!(host.next().await.unwrap().unwrap(), "done");
}
