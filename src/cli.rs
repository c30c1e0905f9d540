// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! CLI (command line interface) of the `feature-verifier` binary.

use std::path::PathBuf;

use clap::Parser;

/// Verify feature files against a catalog of step templates.
#[derive(Clone, Debug, Parser)]
#[command(name = "feature-verifier", version, about)]
pub struct Opts {
    /// Feature files to check. Directories are searched for `*.feature`
    /// files (case-insensitive).
    #[arg(value_name = "FEATURE", required = true)]
    pub features: Vec<PathBuf>,

    /// Step-template catalog to verify against, replacing the embedded
    /// default catalog.
    #[arg(long, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Keep verifying remaining files after a failing one, instead of
    /// stopping at the first failure. Diagnostics are never suppressed.
    #[arg(short, long)]
    pub force: bool,

    /// Show debug logging.
    #[arg(short, long)]
    pub debug: bool,

    /// Disable colored output.
    #[arg(long)]
    pub no_color: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_features_and_flags() {
        let opts = Opts::parse_from([
            "feature-verifier",
            "--force",
            "-d",
            "a.feature",
            "suites/",
        ]);
        assert_eq!(opts.features.len(), 2);
        assert!(opts.force);
        assert!(opts.debug);
        assert!(!opts.no_color);
        assert!(opts.catalog.is_none());
    }

    #[test]
    fn requires_at_least_one_feature() {
        assert!(Opts::try_parse_from(["feature-verifier"]).is_err());
    }

    #[test]
    fn accepts_catalog_override() {
        let opts = Opts::parse_from([
            "feature-verifier",
            "--catalog",
            "steps.catalog",
            "a.feature",
        ]);
        assert_eq!(opts.catalog, Some(PathBuf::from("steps.catalog")));
    }
}
