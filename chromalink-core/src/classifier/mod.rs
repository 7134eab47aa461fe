//! Interactive color classifier
//!
//! The registry owns label identity and display names; the k-NN model owns
//! the training examples. They are deliberately separate: deleting a name
//! never touches training data.

pub mod knn;
pub mod registry;

pub use knn::{Classification, Example, KnnClassifier, NoDataError, DEFAULT_K};
pub use registry::{InvalidNameError, Label, LabelRegistry, UNKNOWN_LABEL_NAME};
