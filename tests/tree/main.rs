#![allow(
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]

#[path = "../../benches/generators.rs"]
#[allow(dead_code)]
mod generators;

mod end_to_end;
mod growth;
mod leaf_models;
mod routing;
