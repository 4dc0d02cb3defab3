//! Common types shared across console transports.

/// Description of an open console, for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Transport name (e.g., "serial", "mock").
    pub name: String,

    /// Device path as configured, or a label for mocks.
    pub path: String,

    /// Baud rate, when the transport has one.
    pub baud_rate: Option<u32>,
}

impl DeviceInfo {
    /// Create a new DeviceInfo with required fields.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            baud_rate: None,
        }
    }

    /// Set the baud rate.
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = Some(baud_rate);
        self
    }
}

impl std::fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.baud_rate {
            Some(baud) => write!(f, "{} {} @ {baud}", self.name, self.path),
            None => write!(f, "{} {}", self.name, self.path),
        }
    }
}
