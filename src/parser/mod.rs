// Parsing of free-form quantity text into comparable numeric fields.

pub mod quantity;
