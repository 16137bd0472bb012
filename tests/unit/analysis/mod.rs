mod extraction;
mod statistics;
