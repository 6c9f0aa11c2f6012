// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Progress bar helpers using indicatif

use indicatif::{ProgressBar, ProgressStyle};

/// Bar for the upload loop; the length is set once records are counted.
pub fn upload_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    if let Ok(style) =
        ProgressStyle::default_bar().template("{msg} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
    {
        pb.set_style(style.progress_chars("█▓▒░"));
    }
    pb.set_message("Uploading");
    pb
}
