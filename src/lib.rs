// colsim: row-by-row similarity between two spreadsheet columns
//
// This is the library root. Each module corresponds to one stage of a run:
// read the dataset, compare cells, score the columns, show and write results.

pub mod config;
pub mod dataset;
pub mod output;
pub mod scoring;
pub mod similarity;
pub mod status;
