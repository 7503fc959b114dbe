//! File name classification

use proptest::prelude::*;
use stateconf::model::LibraryKind;
use stateconf::store::{classify, ConfigName};
use std::path::{Path, PathBuf};

proptest! {
    #[test]
    fn config_file_name_classifies_back(
        provider in any::<bool>(),
        name in "[a-zA-Z0-9_][a-zA-Z0-9_.-]{0,15}",
    ) {
        let kind = if provider { LibraryKind::Provider } else { LibraryKind::Loader };
        let config = ConfigName::new(kind, name);
        let path = PathBuf::from("/registry").join(config.file_name());
        prop_assert_eq!(classify(&path), Some(config));
    }

    #[test]
    fn classify_depends_on_file_name_only(
        dir in "(/[a-z]{1,6}){0,3}",
        file in "[a-z-]{0,12}(\\.conf|\\.md|)",
    ) {
        let there = Path::new(&dir).join(&file);
        let here = Path::new(&file);
        prop_assert_eq!(classify(&there), classify(here));
        prop_assert_eq!(classify(&there), classify(&there));
    }
}
