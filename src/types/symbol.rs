use std::fmt;

/// Buy-side token type as reported by the orders feed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenType {
    Eth,
    Erc20,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Eth => "ETH",
            Self::Erc20 => "ERC20",
        }
    }

    /// Parses a buy-currency flag. `None` means "any buy currency",
    /// which is also the fallback for unrecognized values.
    pub fn from_flag(flag: &str) -> Option<Self> {
        match flag.trim().to_ascii_uppercase().as_str() {
            "ETH" => Some(Self::Eth),
            "ERC20" => Some(Self::Erc20),
            _ => None,
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Crypto currency symbol used for spot-rate lookups.
///
/// Open-ended: token types the feed reports pass through unchanged,
/// except the stablecoin type which is mapped to `USDC`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CryptoSymbol(String);

impl CryptoSymbol {
    pub const STABLECOIN_TOKEN_TYPE: &'static str = "ERC20";

    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn eth() -> Self {
        Self::new("ETH")
    }

    pub fn imx() -> Self {
        Self::new("IMX")
    }

    pub fn usdc() -> Self {
        Self::new("USDC")
    }

    pub fn from_token_type(token_type: &str) -> Self {
        if token_type == Self::STABLECOIN_TOKEN_TYPE {
            Self::usdc()
        } else {
            Self::new(token_type)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CryptoSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Display (fiat) currency.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum FiatSymbol {
    #[default]
    Usd,
    Eur,
    Gbp,
}

impl FiatSymbol {
    pub const ALL: [FiatSymbol; 3] = [Self::Usd, Self::Gbp, Self::Eur];

    pub fn code(&self) -> &'static str {
        match self {
            Self::Usd => "USD",
            Self::Eur => "EUR",
            Self::Gbp => "GBP",
        }
    }

    pub fn sign(&self) -> &'static str {
        match self {
            Self::Usd => "$",
            Self::Eur => "€",
            Self::Gbp => "£",
        }
    }

    /// Lossy parse, falls back to USD.
    pub fn from_flag(flag: &str) -> Self {
        match flag.trim().to_ascii_uppercase().as_str() {
            "EUR" => Self::Eur,
            "GBP" => Self::Gbp,
            _ => Self::Usd,
        }
    }
}

impl fmt::Display for FiatSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
