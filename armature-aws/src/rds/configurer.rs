//! Application hook for customizing RDS datasource creation.

use std::fmt;
use std::sync::Arc;

use super::datasource::DataSourceFactory;
use crate::{AwsError, Result};

/// Supplies the factory used for every registered RDS datasource.
///
/// At most one configurer may be present in an application.
pub trait RdsInstanceConfigurer: Send + Sync + fmt::Debug {
    fn data_source_factory(&self) -> Arc<dyn DataSourceFactory>;
}

/// The single configurer, `None` when there is none.
///
/// Fails with [`AwsError::MultipleConfigurers`] for two or more.
pub fn select_configurer(
    configurers: &[Arc<dyn RdsInstanceConfigurer>],
) -> Result<Option<Arc<dyn RdsInstanceConfigurer>>> {
    match configurers {
        [] => Ok(None),
        [configurer] => Ok(Some(Arc::clone(configurer))),
        _ => Err(AwsError::MultipleConfigurers(configurers.len())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rds::UrlDataSourceFactory;

    #[derive(Debug)]
    struct Pooled;

    impl RdsInstanceConfigurer for Pooled {
        fn data_source_factory(&self) -> Arc<dyn DataSourceFactory> {
            Arc::new(UrlDataSourceFactory::new().with_property("maxConnections", "20"))
        }
    }

    fn configurers(count: usize) -> Vec<Arc<dyn RdsInstanceConfigurer>> {
        (0..count)
            .map(|_| Arc::new(Pooled) as Arc<dyn RdsInstanceConfigurer>)
            .collect()
    }

    #[test]
    fn test_none_or_one() {
        assert!(select_configurer(&configurers(0)).unwrap().is_none());
        assert!(select_configurer(&configurers(1)).unwrap().is_some());
    }

    #[test]
    fn test_more_than_one_fails() {
        let err = select_configurer(&configurers(2)).unwrap_err();
        assert!(matches!(err, AwsError::MultipleConfigurers(2)));
        assert_eq!(err.to_string(), "Only one RdsInstanceConfigurer may exist, found 2");
    }
}
