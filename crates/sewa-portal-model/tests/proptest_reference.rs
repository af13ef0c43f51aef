use proptest::prelude::*;
use proptest::test_runner::Config;
use sewa_portal_model::{ReferenceId, FEEDBACK_PREFIX, REQUEST_PREFIX};

proptest! {
    #![proptest_config(Config::with_cases(256))]
    #[test]
    fn every_generated_code_parses_back_to_itself(feedback in any::<bool>()) {
        let prefix = if feedback { FEEDBACK_PREFIX } else { REQUEST_PREFIX };
        let id = ReferenceId::generate(prefix);
        let reparsed = ReferenceId::parse(id.as_str()).expect("own output must parse");
        prop_assert_eq!(reparsed.as_str(), id.as_str());
        prop_assert_eq!(reparsed.is_feedback(), feedback);
    }

    #[test]
    fn parse_never_accepts_nine_digit_codes_with_unknown_prefixes(
        prefix in "[A-Z]{2,4}",
        digits in "[0-9]{9}"
    ) {
        prop_assume!(prefix != REQUEST_PREFIX && prefix != FEEDBACK_PREFIX);
        let candidate = format!("{prefix}{digits}");
        prop_assert!(ReferenceId::parse(&candidate).is_err());
    }
}
