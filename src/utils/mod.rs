pub mod rfc3339;
