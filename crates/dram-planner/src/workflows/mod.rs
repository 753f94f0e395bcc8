pub mod tasting;
