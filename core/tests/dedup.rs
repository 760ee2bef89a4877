use chrono::NaiveDate;
use payout_core::{
    config::DedupTolerances,
    dedup::{deduplicate, group_duplicates},
    error::PayoutError,
    record::{MatchOutcome, MatchStep, MatchedVideoRecord, RawVideoRecord},
    types::Platform,
};
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64Mcg;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, d).expect("valid day")
}

fn matched_for(creator_id: &str, records: Vec<RawVideoRecord>) -> Vec<MatchedVideoRecord> {
    records
        .into_iter()
        .enumerate()
        .map(|(record_index, record)| MatchedVideoRecord {
            record_index,
            record,
            outcome: MatchOutcome::Matched {
                creator_id: creator_id.into(),
                step:       MatchStep::Handle,
            },
        })
        .collect()
}

fn matched(records: Vec<RawVideoRecord>) -> Vec<MatchedVideoRecord> {
    matched_for("kevin-rhee", records)
}

#[test]
fn cross_posted_video_merges_into_one() {
    let records = matched(vec![
        RawVideoRecord::new(Platform::Instagram, "kev.math", 5_000)
            .with_caption("Learn Calculus Tips")
            .with_date(day(1)),
        RawVideoRecord::new(Platform::Tiktok, "kevmath", 8_000)
            .with_caption("learn calculus tips")
            .with_url("https://www.tiktok.com/@kevmath/video/1")
            .with_date(day(1)),
        RawVideoRecord::new(Platform::Youtube, "kevmath", 2_000)
            .with_caption("LEARN CALCULUS TIPS ")
            .with_date(day(1)),
    ]);

    let videos = deduplicate(&records, &DedupTolerances::default()).expect("dedup");

    assert_eq!(videos.len(), 1);
    let video = &videos[0];
    assert_eq!(video.total_views, 15_000);
    assert_eq!(video.platform, Platform::Tiktok);
    assert_eq!(video.video_url, "https://www.tiktok.com/@kevmath/video/1");
    assert_eq!(video.representative, 1);
    assert_eq!(video.member_count, 3);
    assert_eq!(video.platforms.len(), 3);
}

#[test]
fn similarity_chains_into_one_group() {
    // A~B and B~C are one day apart; A and C are two days apart.
    let records = matched(vec![
        RawVideoRecord::new(Platform::Instagram, "k", 100).with_caption("limits").with_date(day(1)),
        RawVideoRecord::new(Platform::Tiktok, "k", 200).with_caption("limits").with_date(day(2)),
        RawVideoRecord::new(Platform::Youtube, "k", 300).with_caption("limits").with_date(day(3)),
    ]);

    let groups = group_duplicates(&records, &DedupTolerances::default()).expect("groups");
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].members, vec![0, 1, 2]);

    // Without the middle record the ends stay apart.
    let ends = matched(vec![records[0].record.clone(), records[2].record.clone()]);
    assert_eq!(deduplicate(&ends, &DedupTolerances::default()).expect("dedup").len(), 2);
}

#[test]
fn tolerance_boundaries_are_inclusive() {
    let tol = DedupTolerances::default();
    let within = matched(vec![
        RawVideoRecord::new(Platform::Instagram, "k", 1).with_caption("x").with_duration(30),
        RawVideoRecord::new(Platform::Tiktok, "k", 1).with_caption("x").with_duration(35),
    ]);
    assert_eq!(deduplicate(&within, &tol).expect("dedup").len(), 1);

    let beyond = matched(vec![
        RawVideoRecord::new(Platform::Instagram, "k", 1).with_caption("x").with_duration(30),
        RawVideoRecord::new(Platform::Tiktok, "k", 1).with_caption("x").with_duration(36),
    ]);
    assert_eq!(deduplicate(&beyond, &tol).expect("dedup").len(), 2);

    let wider = DedupTolerances { date_days: 2, duration_secs: 10 };
    assert_eq!(deduplicate(&beyond, &wider).expect("dedup").len(), 1);
}

#[test]
fn missing_fields_only_match_missing_fields() {
    let tol = DedupTolerances::default();

    let both_missing = matched(vec![
        RawVideoRecord::new(Platform::Instagram, "k", 1),
        RawVideoRecord::new(Platform::Tiktok, "k", 1),
    ]);
    assert_eq!(deduplicate(&both_missing, &tol).expect("dedup").len(), 1);

    let empty_and_missing_caption = matched(vec![
        RawVideoRecord::new(Platform::Instagram, "k", 1).with_caption("   "),
        RawVideoRecord::new(Platform::Tiktok, "k", 1),
    ]);
    assert_eq!(deduplicate(&empty_and_missing_caption, &tol).expect("dedup").len(), 1);

    let caption_vs_none = matched(vec![
        RawVideoRecord::new(Platform::Instagram, "k", 1).with_caption("derivatives"),
        RawVideoRecord::new(Platform::Tiktok, "k", 1),
    ]);
    assert_eq!(deduplicate(&caption_vs_none, &tol).expect("dedup").len(), 2);

    let date_vs_none = matched(vec![
        RawVideoRecord::new(Platform::Instagram, "k", 1).with_caption("x").with_date(day(1)),
        RawVideoRecord::new(Platform::Tiktok, "k", 1).with_caption("x"),
    ]);
    assert_eq!(deduplicate(&date_vs_none, &tol).expect("dedup").len(), 2);
}

#[test]
fn output_follows_first_appearance() {
    let records = matched(vec![
        RawVideoRecord::new(Platform::Tiktok, "k", 10).with_caption("alpha"),
        RawVideoRecord::new(Platform::Tiktok, "k", 20).with_caption("beta"),
        RawVideoRecord::new(Platform::Instagram, "k", 30).with_caption("alpha"),
        RawVideoRecord::new(Platform::Tiktok, "k", 40).with_caption("gamma"),
    ]);
    let videos = deduplicate(&records, &DedupTolerances::default()).expect("dedup");

    let captions: Vec<_> = videos.iter().map(|v| v.caption.clone().unwrap_or_default()).collect();
    assert_eq!(captions, vec!["alpha", "beta", "gamma"]);
    assert_eq!(videos[0].total_views, 40);
    assert_eq!(videos[0].platform, Platform::Instagram);
}

#[test]
fn representative_tie_goes_to_first_seen() {
    let ig = RawVideoRecord::new(Platform::Instagram, "k", 5_000).with_caption("tie");
    let tt = RawVideoRecord::new(Platform::Tiktok, "k", 5_000).with_caption("tie");
    let tol = DedupTolerances::default();

    let ig_first = deduplicate(&matched(vec![ig.clone(), tt.clone()]), &tol).expect("dedup");
    let tt_first = deduplicate(&matched(vec![tt, ig]), &tol).expect("dedup");

    assert_eq!(ig_first[0].platform, Platform::Instagram);
    assert_eq!(tt_first[0].platform, Platform::Tiktok);
    assert_eq!(ig_first[0].total_views, tt_first[0].total_views);
}

fn random_records(rng: &mut Pcg64Mcg, n: usize) -> Vec<RawVideoRecord> {
    let captions = ["integrals", "limits", "derivatives", ""];
    let platforms = Platform::ALL;
    (0..n)
        .map(|_| {
            let mut r = RawVideoRecord::new(
                platforms[rng.gen_range(0..platforms.len())],
                "kevmath",
                rng.gen_range(0..200_000),
            )
            .with_caption(captions[rng.gen_range(0..captions.len())])
            .with_date(day(rng.gen_range(1..=6)));
            if rng.gen_bool(0.7) {
                r = r.with_duration(rng.gen_range(20..=40));
            }
            r
        })
        .collect()
}

fn sorted_totals(records: &[MatchedVideoRecord]) -> Vec<u64> {
    let mut totals: Vec<u64> = deduplicate(records, &DedupTolerances::default())
        .expect("dedup")
        .iter()
        .map(|v| v.total_views)
        .collect();
    totals.sort_unstable();
    totals
}

#[test]
fn grouping_is_order_independent() {
    let mut rng = Pcg64Mcg::seed_from_u64(0x5EED_0001);
    for _ in 0..20 {
        let mut raw = random_records(&mut rng, 30);
        let expected = sorted_totals(&matched(raw.clone()));
        for _ in 0..5 {
            raw.shuffle(&mut rng);
            assert_eq!(sorted_totals(&matched(raw.clone())), expected);
        }
    }
}

#[test]
fn dedup_is_idempotent() {
    let mut rng = Pcg64Mcg::seed_from_u64(0x5EED_0002);
    let tol = DedupTolerances::default();
    for _ in 0..20 {
        let first = deduplicate(&matched(random_records(&mut rng, 25)), &tol).expect("dedup");

        // Re-expand each unique video as a single record carrying its total.
        let singletons: Vec<RawVideoRecord> = first
            .iter()
            .map(|v| RawVideoRecord {
                platform:         v.platform,
                account_handle:   "kevmath".into(),
                display_name:     None,
                video_url:        v.video_url.clone(),
                caption:          v.caption.clone(),
                published_date:   v.published_date,
                duration_seconds: v.duration_seconds,
                view_count:       Some(v.total_views),
            })
            .collect();
        let second = deduplicate(&matched(singletons), &tol).expect("dedup");

        assert_eq!(second.len(), first.len());
        assert_eq!(
            second.iter().map(|v| v.total_views).collect::<Vec<_>>(),
            first.iter().map(|v| v.total_views).collect::<Vec<_>>()
        );
    }
}

#[test]
fn mixed_creators_are_rejected() {
    let mut records = matched(vec![RawVideoRecord::new(Platform::Tiktok, "k", 1)]);
    records.extend(matched_for("someone-else", vec![RawVideoRecord::new(Platform::Tiktok, "s", 1)]));

    match deduplicate(&records, &DedupTolerances::default()) {
        Err(PayoutError::MixedCreators { expected, found }) => {
            assert_eq!(expected, "kevin-rhee");
            assert_eq!(found, "someone-else");
        }
        other => panic!("expected MixedCreators, got {other:?}"),
    }
}

#[test]
fn empty_input_yields_nothing() {
    assert!(deduplicate(&[], &DedupTolerances::default()).expect("dedup").is_empty());
}
