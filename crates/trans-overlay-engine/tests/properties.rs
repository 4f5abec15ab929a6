use rstest::rstest;
use trans_overlay_engine::render::emoji::{from_surrogates, to_surrogates};
use trans_overlay_engine::{
    AllowList, AllowListSanitizer, LevelKey, RichTextRenderer, Sanitizer, parse,
};

/// Unmarked first segment is the primary post, also after alias resolution
#[rstest]
#[case("  主翻译  ")]
#[case("主翻译##层1 回复")]
#[case("plain\nmultiline##图片1 cap##全覆盖")]
#[case("3月1日发布新歌")]
#[case("2024年的最后一天##图片1 照片")]
fn unmarked_first_segment_is_primary(#[case] raw: &str) {
    let expected = raw.split("##").next().unwrap().trim();
    let mut set = parse(raw, None);
    assert_eq!(set.primary().map(|l| l.content.as_str()), Some(expected));

    set.resolve_primary(4);
    assert_eq!(
        set.level(LevelKey::Numbered(4)).map(|l| l.content.as_str()),
        Some(expected)
    );
}

#[test]
fn inline_counter_restarts_per_level() {
    let set = parse("a##层1 b##内嵌 c##层2 d##内嵌 e", None);

    let first = set.level(LevelKey::Numbered(1)).unwrap();
    let second = set.level(LevelKey::Numbered(2)).unwrap();
    assert_eq!(first.inlevel[&1].content, "c");
    assert_eq!(second.inlevel[&1].content, "e");
    assert_eq!(second.inlevel.len(), 1);
}

#[rstest]
#[case("<p>hello</p>")]
#[case("<a href=\"https://x.test/?a=1&b=<2>\" title='\"q\"'>x</a>")]
#[case("<img src=\"javascript:alert(1)\" alt=a onerror=x()>")]
#[case("<div style=\"color:red;position:absolute;background:url(javascript:x)\">d</div>")]
#[case("<<p>>text</p></p><")]
#[case("<table border=1><tbody><td colspan=\"2\">c</td></tbody></table>")]
#[case("<!-- note --><b>bold</b><!-- unterminated")]
#[case("<span style='font-family: \"A B\"; color: blue'>s</span>")]
#[case("5 > 3 & 2 < 4 \"quoted\" 'single'")]
#[case("<a href=\"&#106;avascript:alert(1)\" title=\"&amp;&quot;\">e</a>")]
#[case("<font color=red size=3 face=serif>f</font><hr/><br>")]
#[case("<p title=\"a>b\">unterminated quote")]
fn sanitizing_is_idempotent(#[case] input: &str) {
    let sanitizer = AllowListSanitizer::new(64 * 1024);
    let allowed = AllowList::overlay_default();
    let once = sanitizer.sanitize(input, &allowed).unwrap();
    let twice = sanitizer.sanitize(&once, &allowed).unwrap();
    assert_eq!(twice, once);
}

#[rstest]
#[case("<a href=\"javascript:alert(1)\">x</a>")]
#[case("<a href=\"JaVaScRiPt:alert(1)\">x</a>")]
#[case("<a href=\"  javascript:alert(1)\">x</a>")]
#[case("<a href=\"jav\tascript:alert(1)\">x</a>")]
#[case("<a href=\"jav&#x09;ascript:alert(1)\">x</a>")]
#[case("<a href=\"javascript&colon;alert(1)\">x</a>")]
#[case("<a href=\"&#106;avascript:alert(1)\">x</a>")]
#[case("<a title=\"javascript:alert(1)\">x</a>")]
#[case("<img src=\"vbscript:msgbox(1)\" alt=i>")]
fn script_schemes_never_survive(#[case] input: &str) {
    let html = RichTextRenderer::default().render(input).to_lowercase();
    assert!(!html.contains("javascript:"), "{html}");
    assert!(!html.contains("vbscript:"), "{html}");
}

#[test]
fn surrogate_encoding_round_trips_every_scalar_value() {
    for cp in (0..=0x10FFFFu32).filter(|cp| char::from_u32(*cp).is_some()) {
        let (high, low) = to_surrogates(cp);
        assert_eq!(from_surrogates(high, low), cp);
    }
    assert_eq!(to_surrogates(0x1F600), (0xD83D, Some(0xDE00)));
}
