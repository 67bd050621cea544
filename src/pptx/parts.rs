//! Package-level PPTX parts: content types, relationships, presentation,
//! master, layout, theme and document properties.
//!
//! The master and the single blank layout carry no placeholders; every slide
//! positions its own text boxes and picture (see [`super::slide`]).

use super::xml_text;
use chrono::{DateTime, SecondsFormat, Utc};

pub(crate) const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

pub(crate) const NS_PRESENTATION: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const REL_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_OFFICE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

pub(crate) const EMPTY_GROUP: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

/// A slide-level relationship target.
pub(crate) struct Relationship<'a> {
    pub id: &'a str,
    pub kind: &'a str,
    pub target: &'a str,
}

pub(crate) fn relationships(rels: &[Relationship<'_>]) -> String {
    let mut xml = format!(r#"{XML_DECL}<Relationships xmlns="{REL_NS}">"#);
    for rel in rels {
        let kind = if rel.kind.starts_with("http") {
            rel.kind.to_string()
        } else {
            format!("{REL_OFFICE}/{}", rel.kind)
        };
        xml.push_str(&format!(
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            rel.id, kind, rel.target
        ));
    }
    xml.push_str("</Relationships>");
    xml
}

/// `[Content_Types].xml` for `slide_count` slides and the given media
/// extensions (`(extension, mime)` pairs, deduplicated by the caller).
pub(crate) fn content_types(slide_count: usize, media: &[(String, String)]) -> String {
    let mut xml = format!(
        r#"{XML_DECL}<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/>"#
    );
    for (ext, mime) in media {
        xml.push_str(&format!(
            r#"<Default Extension="{ext}" ContentType="{mime}"/>"#
        ));
    }
    xml.push_str(
        r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/><Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/><Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/><Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/><Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#,
    );
    for n in 1..=slide_count {
        xml.push_str(&format!(
            r#"<Override PartName="/ppt/slides/slide{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
        ));
    }
    xml.push_str("</Types>");
    xml
}

pub(crate) fn root_relationships() -> String {
    relationships(&[
        Relationship {
            id: "rId1",
            kind: "officeDocument",
            target: "ppt/presentation.xml",
        },
        Relationship {
            id: "rId2",
            kind: "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties",
            target: "docProps/core.xml",
        },
        Relationship {
            id: "rId3",
            kind: "extended-properties",
            target: "docProps/app.xml",
        },
    ])
}

/// `ppt/presentation.xml`. Slide relationships start at `rId3`.
pub(crate) fn presentation(slide_count: usize, cx: i64, cy: i64) -> String {
    let mut xml = format!(
        r#"{XML_DECL}<p:presentation {NS_PRESENTATION} saveSubsetFonts="1"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#
    );
    if slide_count > 0 {
        xml.push_str("<p:sldIdLst>");
        for n in 0..slide_count {
            xml.push_str(&format!(
                r#"<p:sldId id="{}" r:id="rId{}"/>"#,
                256 + n,
                n + 3
            ));
        }
        xml.push_str("</p:sldIdLst>");
    }
    xml.push_str(&format!(
        r#"<p:sldSz cx="{cx}" cy="{cy}" type="screen4x3"/><p:notesSz cx="{cy}" cy="{cx}"/></p:presentation>"#
    ));
    xml
}

pub(crate) fn presentation_relationships(slide_count: usize) -> String {
    let targets: Vec<(String, String)> = (1..=slide_count)
        .map(|n| (format!("rId{}", n + 2), format!("slides/slide{n}.xml")))
        .collect();
    let mut rels = vec![
        Relationship {
            id: "rId1",
            kind: "slideMaster",
            target: "slideMasters/slideMaster1.xml",
        },
        Relationship {
            id: "rId2",
            kind: "theme",
            target: "theme/theme1.xml",
        },
    ];
    rels.extend(targets.iter().map(|(id, target)| Relationship {
        id,
        kind: "slide",
        target,
    }));
    relationships(&rels)
}

pub(crate) fn slide_master() -> String {
    format!(
        r#"{XML_DECL}<p:sldMaster {NS_PRESENTATION}><p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg><p:spTree>{EMPTY_GROUP}</p:spTree></p:cSld><p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/><p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst><p:txStyles><p:titleStyle/><p:bodyStyle/><p:otherStyle/></p:txStyles></p:sldMaster>"#
    )
}

pub(crate) fn slide_master_relationships() -> String {
    relationships(&[
        Relationship {
            id: "rId1",
            kind: "slideLayout",
            target: "../slideLayouts/slideLayout1.xml",
        },
        Relationship {
            id: "rId2",
            kind: "theme",
            target: "../theme/theme1.xml",
        },
    ])
}

pub(crate) fn slide_layout() -> String {
    format!(
        r#"{XML_DECL}<p:sldLayout {NS_PRESENTATION} type="blank" preserve="1"><p:cSld name="Blank"><p:spTree>{EMPTY_GROUP}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#
    )
}

pub(crate) fn slide_layout_relationships() -> String {
    relationships(&[Relationship {
        id: "rId1",
        kind: "slideMaster",
        target: "../slideMasters/slideMaster1.xml",
    }])
}

pub(crate) fn theme() -> String {
    const FILL: &str = r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#;
    const LINE: &str = r#"<a:ln w="9525"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#;
    const EFFECT: &str = "<a:effectStyle><a:effectLst/></a:effectStyle>";
    format!(
        r#"{XML_DECL}<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="Office Theme"><a:themeElements><a:clrScheme name="Office"><a:dk1><a:sysClr val="windowText" lastClr="000000"/></a:dk1><a:lt1><a:sysClr val="window" lastClr="FFFFFF"/></a:lt1><a:dk2><a:srgbClr val="1F497D"/></a:dk2><a:lt2><a:srgbClr val="EEECE1"/></a:lt2><a:accent1><a:srgbClr val="4F81BD"/></a:accent1><a:accent2><a:srgbClr val="C0504D"/></a:accent2><a:accent3><a:srgbClr val="9BBB59"/></a:accent3><a:accent4><a:srgbClr val="8064A2"/></a:accent4><a:accent5><a:srgbClr val="4BACC6"/></a:accent5><a:accent6><a:srgbClr val="F79646"/></a:accent6><a:hlink><a:srgbClr val="0000FF"/></a:hlink><a:folHlink><a:srgbClr val="800080"/></a:folHlink></a:clrScheme><a:fontScheme name="Office"><a:majorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="Calibri"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme><a:fmtScheme name="Office"><a:fillStyleLst>{FILL}{FILL}{FILL}</a:fillStyleLst><a:lnStyleLst>{LINE}{LINE}{LINE}</a:lnStyleLst><a:effectStyleLst>{EFFECT}{EFFECT}{EFFECT}</a:effectStyleLst><a:bgFillStyleLst>{FILL}{FILL}{FILL}</a:bgFillStyleLst></a:fmtScheme></a:themeElements><a:objectDefaults/><a:extraClrSchemeLst/></a:theme>"#
    )
}

pub(crate) fn core_properties(title: &str, created: DateTime<Utc>) -> String {
    let stamp = created.to_rfc3339_opts(SecondsFormat::Secs, true);
    format!(
        r#"{XML_DECL}<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>{}</dc:title><dc:creator>edgequake-pdf2pptx</dc:creator><dcterms:created xsi:type="dcterms:W3CDTF">{stamp}</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">{stamp}</dcterms:modified></cp:coreProperties>"#,
        xml_text(title)
    )
}

pub(crate) fn app_properties(slide_count: usize) -> String {
    format!(
        r#"{XML_DECL}<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes"><Application>edgequake-pdf2pptx</Application><Slides>{slide_count}</Slides></Properties>"#
    )
}
