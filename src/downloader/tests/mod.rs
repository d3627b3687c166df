use super::test_helpers::*;
use super::*;
use crate::error::Error;
use crate::types::{AudioFormat, JobState, PackagingOutcome, ProgressMarker};
use std::sync::Arc;

mod lifecycle;
