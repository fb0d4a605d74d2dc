use super::{ConfigError, FleetError, HttpError, MetricsError, RpcError, ValidationError};

macro_rules! impl_test_expectations {
    ($($error:ident),+ $(,)?) => {
        $(
            impl From<&'static str> for $error {
                fn from(message: &'static str) -> Self {
                    $error::TestExpectation { message }
                }
            }

            impl From<String> for $error {
                fn from(value: String) -> Self {
                    $error::TestExpectationValue {
                        message: "Test expectation failed",
                        value,
                    }
                }
            }
        )+
    };
}

impl_test_expectations!(
    ValidationError,
    ConfigError,
    HttpError,
    MetricsError,
    RpcError,
    FleetError,
);
