/// Filters for Get Transaction History. Unset fields are left out of the
/// query, which returns every transaction.
///
/// https://developer.apple.com/documentation/appstoreserverapi/get-transaction-history
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionHistoryRequest {
    /// UNIX time in milliseconds. Only transactions purchased at or after this
    /// instant are returned.
    pub start_date: Option<i64>,
    /// UNIX time in milliseconds. Only transactions purchased before this
    /// instant are returned.
    pub end_date: Option<i64>,
    pub product_ids: Vec<String>,
    pub sort: Option<HistoryOrder>,
    /// `Some(true)` returns only revoked transactions, `Some(false)` only
    /// unrevoked ones.
    pub revoked: Option<bool>,
}

/// Order of the records by their modification date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryOrder {
    Ascending,
    Descending,
}

impl HistoryOrder {
    fn as_str(&self) -> &'static str {
        match self {
            HistoryOrder::Ascending => "ASCENDING",
            HistoryOrder::Descending => "DESCENDING",
        }
    }
}

impl TransactionHistoryRequest {
    /// Query parameters for one page. `productId` repeats once per product.
    pub(crate) fn query(&self, revision: Option<&str>) -> Vec<(&'static str, String)> {
        let mut query = Vec::new();
        if let Some(revision) = revision {
            query.push(("revision", revision.to_string()));
        }
        if let Some(start_date) = self.start_date {
            query.push(("startDate", start_date.to_string()));
        }
        if let Some(end_date) = self.end_date {
            query.push(("endDate", end_date.to_string()));
        }
        for product_id in &self.product_ids {
            query.push(("productId", product_id.clone()));
        }
        if let Some(sort) = self.sort {
            query.push(("sort", sort.as_str().to_string()));
        }
        if let Some(revoked) = self.revoked {
            query.push(("revoked", revoked.to_string()));
        }
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_request_only_carries_revision() {
        assert!(TransactionHistoryRequest::default().query(None).is_empty());
        assert_eq!(
            TransactionHistoryRequest::default().query(Some("rev")),
            vec![("revision", "rev".to_string())]
        );
    }

    #[test]
    fn test_filters_become_query_parameters() {
        let request = TransactionHistoryRequest {
            start_date: Some(1698148900000),
            end_date: None,
            product_ids: vec!["monthly".to_string(), "yearly".to_string()],
            sort: Some(HistoryOrder::Descending),
            revoked: Some(false),
        };
        assert_eq!(
            request.query(None),
            vec![
                ("startDate", "1698148900000".to_string()),
                ("productId", "monthly".to_string()),
                ("productId", "yearly".to_string()),
                ("sort", "DESCENDING".to_string()),
                ("revoked", "false".to_string()),
            ]
        );
    }
}
