pub mod dashboard;
pub mod error;
pub mod gateway;
pub mod panel;
pub mod refresh;
pub mod source;

#[cfg(test)]
pub(crate) mod test_support;
