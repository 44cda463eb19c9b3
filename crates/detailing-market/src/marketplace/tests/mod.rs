mod common;

mod purchases;
mod routing;
