pub(crate) mod companies;
pub(crate) mod employees;
pub(crate) mod ingredients;
pub(crate) mod pantry;
pub(crate) mod recipes;
