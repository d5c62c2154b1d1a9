use super::TokenType;

/// Upper bound of the orders feed page size.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Page size used when the builder is not told otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Metadata attribute used to partition listings by rarity tier.
pub const RARITY_ATTRIBUTE: &str = "Rarity";

/// Listing status filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OrderStatus {
    #[default]
    Active,
    Filled,
    Cancelled,
    Expired,
    Inactive,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Filled => "filled",
            Self::Cancelled => "cancelled",
            Self::Expired => "expired",
            Self::Inactive => "inactive",
        }
    }

    /// Lossy parse, falls back to `active`.
    pub fn from_flag(flag: &str) -> Self {
        match flag.trim().to_ascii_lowercase().as_str() {
            "filled" => Self::Filled,
            "cancelled" => Self::Cancelled,
            "expired" => Self::Expired,
            "inactive" => Self::Inactive,
            _ => Self::Active,
        }
    }
}

/// Field the feed orders listings by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OrderBy {
    CreatedAt,
    ExpiredAt,
    #[default]
    PriceWithFees,
    UpdatedAt,
}

impl OrderBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::ExpiredAt => "expired_at",
            Self::PriceWithFees => "buy_quantity_with_fees",
            Self::UpdatedAt => "updated_at",
        }
    }

    /// Lossy parse, falls back to price with fees.
    pub fn from_flag(flag: &str) -> Self {
        match flag.trim().to_ascii_lowercase().as_str() {
            "created_at" => Self::CreatedAt,
            "expired_at" => Self::ExpiredAt,
            "updated_at" => Self::UpdatedAt,
            _ => Self::PriceWithFees,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    /// Lossy parse, falls back to ascending.
    pub fn from_flag(flag: &str) -> Self {
        match flag.trim().to_ascii_lowercase().as_str() {
            "desc" => Self::Desc,
            _ => Self::Asc,
        }
    }
}

/// Render mode of a market query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Summary,
    Detailed,
}

impl OutputFormat {
    /// Lossy parse, falls back to summary.
    pub fn from_flag(flag: &str) -> Self {
        match flag.trim().to_ascii_lowercase().as_str() {
            "detailed" => Self::Detailed,
            _ => Self::Summary,
        }
    }
}

/// Filter for one orders feed request.
///
/// Built once with [`OrderQueryConfig::builder`] and never mutated afterwards.
/// Page size is clamped to `[1, MAX_PAGE_SIZE]`.
#[derive(Clone, Debug, PartialEq)]
pub struct OrderQueryConfig {
    sell_token_address: String,
    buy_token_type: Option<TokenType>,
    status: OrderStatus,
    rarity: Vec<String>,
    sell_metadata: Option<String>,
    order_by: OrderBy,
    direction: SortDirection,
    page_size: u32,
    user: Option<String>,
    sell_token_id: Option<String>,
}

impl OrderQueryConfig {
    pub fn builder(sell_token_address: impl Into<String>) -> OrderQueryBuilder {
        OrderQueryBuilder::new(sell_token_address)
    }

    pub fn sell_token_address(&self) -> &str {
        &self.sell_token_address
    }

    pub fn buy_token_type(&self) -> Option<TokenType> {
        self.buy_token_type
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn rarity(&self) -> &[String] {
        &self.rarity
    }

    /// Metadata filter in the feed's wire format, e.g. `{"Rarity":["Common"]}`.
    pub fn sell_metadata(&self) -> Option<&str> {
        self.sell_metadata.as_deref()
    }

    pub fn order_by(&self) -> OrderBy {
        self.order_by
    }

    pub fn direction(&self) -> SortDirection {
        self.direction
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn sell_token_id(&self) -> Option<&str> {
        self.sell_token_id.as_deref()
    }
}

#[derive(Clone, Debug)]
pub struct OrderQueryBuilder {
    sell_token_address: String,
    buy_token_type: Option<TokenType>,
    status: OrderStatus,
    rarity: Vec<String>,
    order_by: OrderBy,
    direction: SortDirection,
    page_size: u32,
    user: Option<String>,
    sell_token_id: Option<String>,
}

impl OrderQueryBuilder {
    fn new(sell_token_address: impl Into<String>) -> Self {
        Self {
            sell_token_address: sell_token_address.into(),
            buy_token_type: Some(TokenType::Eth),
            status: OrderStatus::default(),
            rarity: Vec::new(),
            order_by: OrderBy::default(),
            direction: SortDirection::default(),
            page_size: DEFAULT_PAGE_SIZE,
            user: None,
            sell_token_id: None,
        }
    }

    pub fn buy_token_type(mut self, token_type: Option<TokenType>) -> Self {
        self.buy_token_type = token_type;
        self
    }

    pub fn status(mut self, status: OrderStatus) -> Self {
        self.status = status;
        self
    }

    pub fn rarity<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rarity = values
            .into_iter()
            .map(Into::into)
            .filter(|v: &String| !v.is_empty())
            .collect();
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn direction(mut self, direction: SortDirection) -> Self {
        self.direction = direction;
        self
    }

    pub fn page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into()).filter(|u: &String| !u.is_empty());
        self
    }

    pub fn sell_token_id(mut self, token_id: impl Into<String>) -> Self {
        self.sell_token_id = Some(token_id.into()).filter(|t: &String| !t.is_empty());
        self
    }

    pub fn build(self) -> OrderQueryConfig {
        let sell_metadata = (!self.rarity.is_empty()).then(|| {
            let mut filter = serde_json::Map::new();
            filter.insert(RARITY_ATTRIBUTE.to_string(), self.rarity.clone().into());
            serde_json::Value::Object(filter).to_string()
        });

        OrderQueryConfig {
            sell_token_address: self.sell_token_address,
            buy_token_type: self.buy_token_type,
            status: self.status,
            rarity: self.rarity,
            sell_metadata,
            order_by: self.order_by,
            direction: self.direction,
            page_size: self.page_size.clamp(1, MAX_PAGE_SIZE),
            user: self.user,
            sell_token_id: self.sell_token_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_clamped() {
        let cfg = OrderQueryConfig::builder("0xabc").page_size(0).build();
        assert_eq!(cfg.page_size(), 1);

        let cfg = OrderQueryConfig::builder("0xabc").page_size(5000).build();
        assert_eq!(cfg.page_size(), MAX_PAGE_SIZE);

        let cfg = OrderQueryConfig::builder("0xabc").page_size(7).build();
        assert_eq!(cfg.page_size(), 7);
    }

    #[test]
    fn test_rarity_metadata_wire_format() {
        let cfg = OrderQueryConfig::builder("0xabc").rarity(["Common"]).build();
        assert_eq!(cfg.sell_metadata(), Some(r#"{"Rarity":["Common"]}"#));
        assert_eq!(cfg.rarity(), ["Common".to_string()]);

        let cfg = OrderQueryConfig::builder("0xabc")
            .rarity(["Epic", "Legendary"])
            .build();
        assert_eq!(cfg.sell_metadata(), Some(r#"{"Rarity":["Epic","Legendary"]}"#));

        let cfg = OrderQueryConfig::builder("0xabc").rarity([""]).build();
        assert_eq!(cfg.sell_metadata(), None);
    }

    #[test]
    fn test_builder_defaults() {
        let cfg = OrderQueryConfig::builder("0xabc").user("").build();
        assert_eq!(cfg.buy_token_type(), Some(TokenType::Eth));
        assert_eq!(cfg.status(), OrderStatus::Active);
        assert_eq!(cfg.order_by(), OrderBy::PriceWithFees);
        assert_eq!(cfg.direction(), SortDirection::Asc);
        assert_eq!(cfg.page_size(), DEFAULT_PAGE_SIZE);
        assert_eq!(cfg.user(), None);
        assert_eq!(cfg.sell_token_id(), None);
    }

    #[test]
    fn test_flags_fall_back_to_defaults() {
        assert_eq!(OrderStatus::from_flag("Filled"), OrderStatus::Filled);
        assert_eq!(OrderStatus::from_flag("bogus"), OrderStatus::Active);
        assert_eq!(OrderBy::from_flag("updated_at"), OrderBy::UpdatedAt);
        assert_eq!(OrderBy::from_flag(""), OrderBy::PriceWithFees);
        assert_eq!(SortDirection::from_flag("DESC"), SortDirection::Desc);
        assert_eq!(SortDirection::from_flag("sideways"), SortDirection::Asc);
        assert_eq!(OutputFormat::from_flag("detailed"), OutputFormat::Detailed);
        assert_eq!(OutputFormat::from_flag(""), OutputFormat::Summary);
    }
}
