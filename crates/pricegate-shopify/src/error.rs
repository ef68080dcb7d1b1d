use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorefrontError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rate limited by storefront API (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("GraphQL errors from storefront API: {}", messages.join("; "))]
    GraphQl { messages: Vec<String> },

    #[error("storefront response is missing {field} for {context}")]
    MissingField {
        field: &'static str,
        context: String,
    },

    #[error("cannot parse {field} value \"{raw}\" as a decimal for product {product_id}")]
    InvalidDecimal {
        product_id: String,
        field: &'static str,
        raw: String,
    },

    #[error("cannot extract a numeric ID from gid \"{0}\"")]
    MalformedGid(String),

    #[error("storefront access token contains characters not allowed in an HTTP header")]
    InvalidAccessToken,
}
