//! GraphQL query construction for the Storefront API.

/// Which page of the product connection to request.
///
/// Forward pagination asks for the first N products after a cursor;
/// backward pagination asks for the last N before one. The page size is
/// fixed by configuration, not by the caller of the HTTP endpoint.
#[derive(Debug, Clone, Default)]
pub enum PageRequest {
    #[default]
    First,
    After(String),
    Before(String),
}

impl PageRequest {
    /// Cursors are caller input, so they get the same sanitization as
    /// search terms before landing inside the quoted argument.
    fn pagination_args(&self, page_size: u32) -> String {
        match self {
            PageRequest::First => format!("first: {page_size}"),
            PageRequest::After(cursor) => {
                format!("after: \"{}\", first: {page_size}", sanitize_search_term(cursor))
            }
            PageRequest::Before(cursor) => {
                format!("before: \"{}\", last: {page_size}", sanitize_search_term(cursor))
            }
        }
    }
}

/// Builds the products query: active products sorted by title, optionally
/// filtered to a title prefix, with price, unit measurement, image, and
/// collection data plus the connection's page cursors.
#[must_use]
pub fn products_query(search: Option<&str>, page: &PageRequest, page_size: u32) -> String {
    let query_filter = match search {
        Some(term) if !term.is_empty() => format!("(title:{}*)", sanitize_search_term(term)),
        _ => String::new(),
    };
    let pagination_args = page.pagination_args(page_size);

    format!(
        r#"{{
    products({pagination_args}, query: "(status:active) AND {query_filter}", sortKey: TITLE) {{
        edges {{
            node {{
                id
                title
                images(first: 10) {{
                    edges {{ node {{ url }} }}
                }}
                variants(first: 1) {{
                    edges {{
                        node {{
                            price {{ amount }}
                            unitPriceMeasurement {{
                                quantityValue
                                quantityUnit
                            }}
                        }}
                    }}
                }}
                collections(first: 15) {{
                    edges {{ node {{ id }} }}
                }}
            }}
        }}
        pageInfo {{
            hasNextPage
            hasPreviousPage
            startCursor
            endCursor
        }}
    }}
}}"#
    )
}

/// Builds the lightweight stock query for a single product: live quantity
/// of the first variant plus the `productDetails.unit` metafield.
///
/// Kept separate from the products query so catalog pages stay cheap and
/// the quantity is current at the moment it is asked for.
#[must_use]
pub fn stock_query(product_id: &str) -> String {
    let product_id = sanitize_search_term(product_id);
    format!(
        r#"{{
    product(id: "gid://shopify/Product/{product_id}") {{
        variants(first: 1) {{
            edges {{ node {{ quantityAvailable }} }}
        }}
        metafield(key: "unit", namespace: "productDetails") {{
            value
        }}
    }}
}}"#
    )
}

/// Strips characters that would break out of the quoted GraphQL search
/// string. Search terms are user input; they must not be able to alter the
/// query structure.
fn sanitize_search_term(term: &str) -> String {
    term.chars()
        .filter(|c| !matches!(c, '"' | '\\' | '{' | '}' | '(' | ')'))
        .collect()
}
