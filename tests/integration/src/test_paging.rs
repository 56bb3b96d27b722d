//! Sorting and pagination integration tests.

#[cfg(test)]
mod tests {
    use querystack_core::QueryStackConfig;
    use querystack_filter::{
        QueryError, effective_limit, next_page_info, parse_pagination, parse_sorting,
    };
    use querystack_model::{SortCriteria, SortOrder};

    #[test]
    fn test_should_parse_order_by() {
        let sorting = parse_sorting("last_name ASC, address.city desc, age").unwrap();
        let criteria: Vec<&SortCriteria> = sorting.iter().collect();
        assert_eq!(criteria.len(), 3);
        assert_eq!(criteria[1], &SortCriteria::new("address.city", SortOrder::Desc));
        assert!(criteria[2].is_asc());
        assert_eq!(sorting.to_string(), "last_name asc, address.city desc, age asc");
    }

    #[test]
    fn test_should_reject_malformed_order_by() {
        for input in ["a,,b", "a up", "a desc b"] {
            assert!(
                matches!(parse_sorting(input), Err(QueryError::InvalidSorting(_))),
                "{input}"
            );
        }
    }

    #[test]
    fn test_should_page_through_results() {
        let config = QueryStackConfig::builder().default_limit(2).max_limit(5).build();
        let total = 5_usize;
        let mut offset = String::new();
        let mut pages = Vec::new();

        loop {
            let pagination = parse_pagination("", &offset, "").unwrap();
            let limit = usize::try_from(effective_limit(&pagination, &config)).unwrap();
            let start = usize::try_from(pagination.offset).unwrap();
            let returned = total.saturating_sub(start).min(limit);
            let info = next_page_info(&pagination, &config, returned);
            pages.push(returned);
            if info.is_last_page() {
                break;
            }
            offset = info.offset.to_string();
        }
        assert_eq!(pages, vec![2, 2, 1]);
    }

    #[test]
    fn test_should_clamp_requested_limit() {
        let config = QueryStackConfig::builder().max_limit(50).build();
        let pagination = parse_pagination("1000", "", "").unwrap();
        assert_eq!(effective_limit(&pagination, &config), 50);
    }

    #[test]
    fn test_should_reject_invalid_pagination() {
        assert!(matches!(
            parse_pagination("ten", "", ""),
            Err(QueryError::InvalidPagination(_))
        ));
        assert!(matches!(
            parse_pagination("", "-3", ""),
            Err(QueryError::InvalidPagination(_))
        ));
        assert!(parse_pagination("", "", "null").unwrap().is_first_page());
    }
}
