pub mod patronage;
pub mod product;
pub mod purchase;
