pub mod aggregator;
pub mod comparator;
pub mod matchups;
pub mod scorer;
pub mod tally;
