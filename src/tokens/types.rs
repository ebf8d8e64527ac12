use serde::{Deserialize, Serialize};

/// A tradable asset as listed in the token registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub address: String,
    pub decimals: u8,
    pub symbol: String,
    pub name: String,
    #[serde(rename = "logoURI", default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,
}

impl Token {
    pub fn new(address: &str, decimals: u8, symbol: &str, name: &str) -> Self {
        Self {
            address: address.to_string(),
            decimals,
            symbol: symbol.to_string(),
            name: name.to_string(),
            logo_uri: None,
        }
    }

    /// Addresses are compared case-insensitively (EIP-55 checksums differ in case only)
    pub fn has_address(&self, address: &str) -> bool {
        self.address.eq_ignore_ascii_case(address.trim())
    }

    pub fn is_native(&self, native_address: &str) -> bool {
        self.has_address(native_address)
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.symbol, self.address)
    }
}

/// On-disk token list: `{"tokens": [...]}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenList {
    #[serde(default)]
    pub name: Option<String>,
    pub tokens: Vec<Token>,
}
