/// A decoded request, classified by its literal tag prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Shell command line to run in the working directory
    Run(String),
    /// New working directory
    Move(String),
    Exit,
    /// Anything without a known tag, kept verbatim for logging
    Unknown(String),
}

const RUN_TAG: &str = "RUN";
const MOVE_TAG: &str = "MOVE";
const EXIT_TAG: &str = "EXIT";

impl Request {
    /// Classify a raw request string.
    ///
    /// Tags are matched case-sensitively in the order `RUN`, `MOVE`, `EXIT`;
    /// the payload is whatever follows the tag with surrounding whitespace
    /// trimmed. `EXIT` ignores its payload.
    pub fn parse(raw: &str) -> Self {
        if let Some(payload) = raw.strip_prefix(RUN_TAG) {
            Request::Run(payload.trim().to_string())
        } else if let Some(payload) = raw.strip_prefix(MOVE_TAG) {
            Request::Move(payload.trim().to_string())
        } else if raw.starts_with(EXIT_TAG) {
            Request::Exit
        } else {
            Request::Unknown(raw.to_string())
        }
    }

    /// Tag name used in log lines
    pub fn kind(&self) -> &'static str {
        match self {
            Request::Run(_) => RUN_TAG,
            Request::Move(_) => MOVE_TAG,
            Request::Exit => EXIT_TAG,
            Request::Unknown(_) => "UNKNOWN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_trims_payload() {
        assert_eq!(
            Request::parse("RUN  echo hello \n"),
            Request::Run("echo hello".to_string())
        );
    }

    #[test]
    fn test_parse_run_without_space() {
        assert_eq!(
            Request::parse("RUNecho Connection 3"),
            Request::Run("echo Connection 3".to_string())
        );
    }

    #[test]
    fn test_parse_run_keeps_shell_operators() {
        assert_eq!(
            Request::parse("RUN echo 'a  b' | tr a-z A-Z && ls"),
            Request::Run("echo 'a  b' | tr a-z A-Z && ls".to_string())
        );
    }

    #[test]
    fn test_parse_move() {
        assert_eq!(
            Request::parse("MOVE /tmp "),
            Request::Move("/tmp".to_string())
        );
    }

    #[test]
    fn test_parse_exit_ignores_payload() {
        assert_eq!(Request::parse("EXIT"), Request::Exit);
        assert_eq!(Request::parse("EXIT now please"), Request::Exit);
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert_eq!(
            Request::parse("run ls"),
            Request::Unknown("run ls".to_string())
        );
        assert_eq!(Request::parse("Exit"), Request::Unknown("Exit".to_string()));
    }

    #[test]
    fn test_parse_unknown_tag() {
        assert_eq!(
            Request::parse("SDIR /tmp"),
            Request::Unknown("SDIR /tmp".to_string())
        );
        assert_eq!(Request::parse(""), Request::Unknown(String::new()));
    }

    #[test]
    fn test_parse_requires_prefix_not_substring() {
        assert_eq!(
            Request::parse(" RUN ls"),
            Request::Unknown(" RUN ls".to_string())
        );
    }

    #[test]
    fn test_kind_names_tag() {
        assert_eq!(Request::parse("RUNls").kind(), "RUN");
        assert_eq!(Request::parse("MOVE/").kind(), "MOVE");
        assert_eq!(Request::parse("EXIT").kind(), "EXIT");
        assert_eq!(Request::parse("nope").kind(), "UNKNOWN");
    }
}
