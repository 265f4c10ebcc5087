#[derive(Debug, Clone)]
pub struct StatusLine {
    message: String,
}

pub const READY_STATUS: &str = "Press Enter to edit attributes.";

impl Default for StatusLine {
    fn default() -> Self {
        Self {
            message: READY_STATUS.to_string(),
        }
    }
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_raw(&mut self, msg: impl Into<String>) {
        self.message = msg.into();
    }

    pub fn ready(&mut self) {
        self.message = READY_STATUS.to_string();
    }

    pub fn loading(&mut self, field: &str) {
        self.message = format!("Loading attributes for {field}…");
    }

    pub fn editing(&mut self, help: Option<&str>) {
        self.message = match help {
            Some(help) => format!("Editing • {help}"),
            None => "Editing".to_string(),
        };
    }

    pub fn value_updated(&mut self, field: &str) {
        self.message = format!("{field} updated");
    }

    pub fn saving(&mut self) {
        self.message = "Completing attributes…".to_string();
    }

    pub fn missing_mandatory(&mut self, missing: &[String]) {
        self.message = format!("Required: {}", missing.join(", "));
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_mandatory_lists_fields() {
        let mut status = StatusLine::new();
        status.missing_mandatory(&["HSCode".to_string(), "Lot".to_string()]);
        assert_eq!(status.message(), "Required: HSCode, Lot");
        status.ready();
        assert_eq!(status.message(), READY_STATUS);
    }
}
