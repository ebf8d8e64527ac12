/// Static address -> token mapping, loaded once at startup
use super::types::{Token, TokenList};
use crate::errors::{SwapError, SwapResult};
use crate::logger::{self, LogTag};
use std::collections::HashMap;
use std::path::Path;

/// Polygon list used when no registry file is present
const BUILTIN_TOKENS: &str = r#"{
  "name": "pbws default",
  "tokens": [
    { "address": "0xEeeeeEeeeEeEeeEeEeEeeEEEeeeeEeeeeeeeEEeE", "decimals": 18, "symbol": "MATIC", "name": "Polygon" },
    { "address": "0x0d500B1d8E8eF31E21C99d1Db9A6444d3ADf1270", "decimals": 18, "symbol": "WMATIC", "name": "Wrapped Matic" },
    { "address": "0x2791Bca1f2de4661ED88A30C99A7a9449Aa84174", "decimals": 6, "symbol": "USDC", "name": "USD Coin (PoS)" },
    { "address": "0x8f3Cf7ad23Cd3CaDbD9735AFf958023239c6A063", "decimals": 18, "symbol": "DAI", "name": "Dai Stablecoin (PoS)" },
    { "address": "0x2a93172c8DCCbfBC60a39d56183B7279a2F647b4", "decimals": 18, "symbol": "DG", "name": "decentral.games" }
  ]
}"#;

#[derive(Debug, Clone)]
pub struct TokenRegistry {
    tokens: Vec<Token>,
    by_address: HashMap<String, usize>,
}

impl TokenRegistry {
    pub fn from_tokens(tokens: Vec<Token>) -> SwapResult<Self> {
        let mut by_address = HashMap::with_capacity(tokens.len());
        for (index, token) in tokens.iter().enumerate() {
            let key = token.address.trim().to_lowercase();
            if key.is_empty() {
                return Err(SwapError::configuration_error(format!(
                    "token '{}' has an empty address",
                    token.symbol
                )));
            }
            if by_address.insert(key, index).is_some() {
                return Err(SwapError::configuration_error(format!(
                    "duplicate token address {}",
                    token.address
                )));
            }
        }
        Ok(Self { tokens, by_address })
    }

    pub fn from_json(json: &str) -> SwapResult<Self> {
        let list: TokenList = serde_json::from_str(json)?;
        Self::from_tokens(list.tokens)
    }

    pub fn builtin() -> SwapResult<Self> {
        Self::from_json(BUILTIN_TOKENS)
    }

    /// Load the registry file, falling back to the built-in list when it is missing
    pub fn load(path: &str) -> SwapResult<Self> {
        if !Path::new(path).exists() {
            logger::warning(
                LogTag::Tokens,
                &format!("Token registry '{}' not found, using built-in list", path),
            );
            return Self::builtin();
        }

        let contents = std::fs::read_to_string(path).map_err(|e| {
            SwapError::configuration_error(format!("cannot read '{}': {}", path, e))
        })?;
        let registry = Self::from_json(&contents)?;
        logger::info(
            LogTag::Tokens,
            &format!("Loaded {} tokens from '{}'", registry.len(), path),
        );
        Ok(registry)
    }

    pub fn by_address(&self, address: &str) -> Option<&Token> {
        self.by_address
            .get(&address.trim().to_lowercase())
            .map(|&index| &self.tokens[index])
    }

    pub fn by_symbol(&self, symbol: &str) -> Option<&Token> {
        let symbol = symbol.trim();
        self.tokens
            .iter()
            .find(|token| token.symbol.eq_ignore_ascii_case(symbol))
    }

    /// Resolve a user-supplied address or symbol
    pub fn resolve(&self, query: &str) -> SwapResult<Token> {
        let query = query.trim();
        let found = if query.starts_with("0x") || query.starts_with("0X") {
            self.by_address(query)
        } else {
            self.by_symbol(query)
        };
        found
            .cloned()
            .ok_or_else(|| SwapError::UnknownToken(query.to_string()))
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builtin_registry() {
        let registry = TokenRegistry::builtin().unwrap();
        assert_eq!(registry.len(), 5);
        let usdc = registry.by_symbol("usdc").unwrap();
        assert_eq!(usdc.decimals, 6);
        assert!(registry
            .by_address("0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee")
            .is_some());
    }

    #[test]
    fn test_resolve_by_symbol_or_address() {
        let registry = TokenRegistry::builtin().unwrap();
        assert_eq!(registry.resolve("DG").unwrap().decimals, 18);
        assert_eq!(
            registry
                .resolve("0x2791BCA1F2DE4661ED88A30C99A7A9449AA84174")
                .unwrap()
                .symbol,
            "USDC"
        );
        assert_eq!(
            registry.resolve("NOPE"),
            Err(SwapError::UnknownToken("NOPE".to_string()))
        );
    }

    #[test]
    fn test_duplicate_addresses_are_rejected() {
        let tokens = vec![
            Token::new("0xAbC", 18, "A", "A"),
            Token::new("0xabc", 6, "B", "B"),
        ];
        assert!(matches!(
            TokenRegistry::from_tokens(tokens),
            Err(SwapError::Configuration(_))
        ));
    }

    #[test]
    fn test_load_from_file_and_missing_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"tokens":[{{"address":"0x1111111111111111111111111111111111111111","decimals":8,"symbol":"WBTC","name":"Wrapped BTC","logoURI":"https://example.invalid/wbtc.png"}}]}}"#
        )
        .unwrap();

        let registry = TokenRegistry::load(file.path().to_str().unwrap()).unwrap();
        let wbtc = registry.resolve("wbtc").unwrap();
        assert_eq!(wbtc.decimals, 8);
        assert_eq!(
            wbtc.logo_uri.as_deref(),
            Some("https://example.invalid/wbtc.png")
        );

        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("tokens.json");
        let fallback = TokenRegistry::load(missing.to_str().unwrap()).unwrap();
        assert_eq!(fallback.len(), 5);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        assert!(matches!(
            TokenRegistry::from_json("{\"tokens\": 3}"),
            Err(SwapError::Parse(_))
        ));
    }
}
