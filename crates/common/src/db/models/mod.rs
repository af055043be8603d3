//! SeaORM entity models
//!
//! Database entities for the review store

mod bank;
mod review;

pub use bank::{
    Entity as BankEntity,
    Model as Bank,
    ActiveModel as BankActiveModel,
    Column as BankColumn,
};

pub use review::{
    Entity as ReviewEntity,
    Model as Review,
    ActiveModel as ReviewActiveModel,
    Column as ReviewColumn,
};
