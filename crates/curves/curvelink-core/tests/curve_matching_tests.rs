use curvelink_core::matching::{curve_score, match_curve_names, MatchStrength};
use curvelink_core::{AttrRef, MemoryHost};

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[test]
fn full_agreement_scores_fourteen() {
    assert_eq!(curve_score("jaw.translateY", "jaw", "translateY"), 14);
    assert_eq!(curve_score("JAW.TranslateY", "jaw", "translatey"), 14);
    assert_eq!(curve_score("ja.translate", "jaw", "translateY"), 2);
    assert_eq!(curve_score("brow.rotateX", "jaw", "translateY"), 0);
}

#[test]
fn bare_curve_name_doubles_as_attribute() {
    // "jawOpen" is both node and attribute, so only the attribute bit hits.
    assert_eq!(curve_score("jawOpen", "blendShape1", "jawOpen"), 4);
}

#[test]
fn exact_pairing_beats_containment_only_competitor() {
    let host = MemoryHost::new().with_object("rigA:jaw", &["translateY", "rotateX"]);
    let curves = names(&["ja.translate", "jaw.translateY"]);
    let objects = names(&["rigA:jaw"]);

    let matches = match_curve_names(&host, &curves, &objects);
    assert_eq!(matches.len(), 2);

    assert_eq!(matches[0].dst, AttrRef::new("rigA:jaw", "translateY"));
    assert_eq!(matches[0].curve, "jaw.translateY");
    assert_eq!(matches[0].score, 14);

    // One curve may drive several attributes.
    assert_eq!(matches[1].dst, AttrRef::new("rigA:jaw", "rotateX"));
    assert_eq!(matches[1].curve, "jaw.translateY");
    assert_eq!(matches[1].score, 8);
}

#[test]
fn ties_keep_the_first_curve_seen() {
    let host = MemoryHost::new().with_object("jaw", &["translateY"]);
    let curves = names(&["JAW.translateY", "jaw.TRANSLATEY"]);
    let matches = match_curve_names(&host, &curves, &names(&["jaw"]));
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].curve, "JAW.translateY");
}

#[test]
fn containment_only_pairing_is_kept_and_tagged_fuzzy() {
    let host = MemoryHost::new().with_object("mouth_ctrl", &["open_amount"]);
    let curves = names(&["mouth.open"]);
    let objects = names(&["mouth_ctrl"]);

    let matches = match_curve_names(&host, &curves, &objects);
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].curve, "mouth.open");
    assert_eq!(matches[0].score, 2);
    assert_eq!(matches[0].strength(), MatchStrength::Fuzzy);
}

#[test]
fn missing_objects_contribute_nothing() {
    let host = MemoryHost::new().with_object("jaw", &["translateY"]);
    let curves = names(&["jaw.translateY"]);
    let matches = match_curve_names(&host, &curves, &names(&["ghost", "jaw"]));
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].dst.node.name(), "jaw");
}
