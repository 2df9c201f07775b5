pub(crate) mod dashboard;
pub(crate) mod profile;
pub(crate) mod transactions;
