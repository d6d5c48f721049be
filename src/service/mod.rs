pub mod aggregation;
pub mod consumption;
pub mod importer;
pub mod validator;
