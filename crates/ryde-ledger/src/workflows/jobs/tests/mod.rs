mod common;
mod overlap;
