/// Log tags identify the subsystem a message comes from
///
/// The debug key of a tag is what `--debug <tag>` matches against.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Tokens,
    Quote,
    Approval,
    Transaction,
    Submission,
    Session,
    Wallet,
    Api,
    Other(String),
}

impl LogTag {
    /// Every named tag, in display order
    pub const ALL: [LogTag; 10] = [
        LogTag::System,
        LogTag::Config,
        LogTag::Tokens,
        LogTag::Quote,
        LogTag::Approval,
        LogTag::Transaction,
        LogTag::Submission,
        LogTag::Session,
        LogTag::Wallet,
        LogTag::Api,
    ];

    /// Lowercase key used by `--debug <tag>`
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::Other(name) => name.to_lowercase(),
            named => named.to_plain_string().to_lowercase(),
        }
    }

    /// Uppercase label without colors, used in the file output
    pub fn to_plain_string(&self) -> String {
        match self {
            LogTag::System => "SYSTEM".to_string(),
            LogTag::Config => "CONFIG".to_string(),
            LogTag::Tokens => "TOKENS".to_string(),
            LogTag::Quote => "QUOTE".to_string(),
            LogTag::Approval => "APPROVAL".to_string(),
            LogTag::Transaction => "TX".to_string(),
            LogTag::Submission => "SUBMIT".to_string(),
            LogTag::Session => "SESSION".to_string(),
            LogTag::Wallet => "WALLET".to_string(),
            LogTag::Api => "API".to_string(),
            LogTag::Other(name) => name.to_uppercase(),
        }
    }

    /// Resolve a `--debug` argument to a tag, accepting label or debug key
    pub fn from_debug_key(key: &str) -> LogTag {
        let key = key.trim().to_lowercase();
        LogTag::ALL
            .iter()
            .find(|tag| tag.to_debug_key() == key || tag.variant_name() == key)
            .cloned()
            .unwrap_or(LogTag::Other(key))
    }

    fn variant_name(&self) -> String {
        match self {
            LogTag::Transaction => "transaction".to_string(),
            LogTag::Submission => "submission".to_string(),
            other => other.to_debug_key(),
        }
    }
}

impl std::fmt::Display for LogTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_plain_string())
    }
}
