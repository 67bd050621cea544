//! Per-slide XML: title box, bullet body, optional picture.

use super::parts::{relationships, Relationship, EMPTY_GROUP, NS_PRESENTATION, XML_DECL};
use super::{xml_text, EMU_PER_INCH};
use crate::output::SlideContent;

/// Position and size of a shape in EMU.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Frame {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Frame {
    fn inches(x: f64, y: f64, cx: f64, cy: f64) -> Self {
        let emu = |v: f64| (v * EMU_PER_INCH as f64).round() as i64;
        Self {
            x: emu(x),
            y: emu(y),
            cx: emu(cx),
            cy: emu(cy),
        }
    }

    fn xfrm(&self) -> String {
        format!(
            r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
            self.x, self.y, self.cx, self.cy
        )
    }
}

pub(crate) fn title_frame() -> Frame {
    Frame::inches(0.5, 0.3, 9.0, 0.7)
}

pub(crate) fn body_frame(with_image: bool) -> Frame {
    Frame::inches(0.5, 1.0, if with_image { 5.0 } else { 9.0 }, 4.0)
}

/// Picture frame for an image of `dimensions` pixels: 4in tall, width from
/// the aspect ratio, shrunk to stay inside the right margin.
pub(crate) fn picture_frame(dimensions: Option<(u32, u32)>) -> Frame {
    const LEFT: f64 = 5.6;
    const TOP: f64 = 1.5;
    const HEIGHT: f64 = 4.0;
    const MAX_WIDTH: f64 = 4.0;

    let ratio = match dimensions {
        Some((w, h)) if w > 0 && h > 0 => w as f64 / h as f64,
        _ => 4.0 / 3.0,
    };
    let width = HEIGHT * ratio;
    if width > MAX_WIDTH {
        Frame::inches(LEFT, TOP, MAX_WIDTH, MAX_WIDTH / ratio)
    } else {
        Frame::inches(LEFT, TOP, width, HEIGHT)
    }
}

fn text_box(id: u32, name: &str, frame: Frame, paragraphs: &str) -> String {
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="{name}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr>{}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr><p:txBody><a:bodyPr wrap="square" rtlCol="0"><a:normAutofit/></a:bodyPr><a:lstStyle/>{paragraphs}</p:txBody></p:sp>"#,
        frame.xfrm()
    )
}

fn title_paragraph(title: &str, size: u32) -> String {
    if title.is_empty() {
        return format!(r#"<a:p><a:endParaRPr lang="en-US" sz="{size}" b="1" dirty="0"/></a:p>"#);
    }
    format!(
        r#"<a:p><a:r><a:rPr lang="en-US" sz="{size}" b="1" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#,
        xml_text(title)
    )
}

fn bullet_paragraphs(bullets: &[String], size: u32) -> String {
    if bullets.is_empty() {
        return format!(r#"<a:p><a:endParaRPr lang="en-US" sz="{size}" dirty="0"/></a:p>"#);
    }
    bullets
        .iter()
        .map(|b| {
            format!(
                r#"<a:p><a:pPr marL="342900" indent="-342900"><a:buFont typeface="Arial"/><a:buChar char="&#8226;"/></a:pPr><a:r><a:rPr lang="en-US" sz="{size}" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#,
                xml_text(b)
            )
        })
        .collect()
}

fn picture(id: u32, rel_id: &str, frame: Frame) -> String {
    format!(
        r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Picture {}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr><p:blipFill><a:blip r:embed="{rel_id}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr>{}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#,
        id - 1,
        frame.xfrm()
    )
}

/// `ppt/slides/slideN.xml`.
///
/// `picture` carries the relationship id and frame when the slide shows an
/// image. Title text is bold at `font_pt + 8`, bullets at `font_pt`.
pub(crate) fn slide_xml(slide: &SlideContent, font_pt: u32, picture_ref: Option<(&str, Frame)>) -> String {
    let body_sz = font_pt * 100;
    let title_sz = (font_pt + 8) * 100;

    let mut tree = String::from(EMPTY_GROUP);
    tree.push_str(&text_box(2, "Title 1", title_frame(), &title_paragraph(&slide.title, title_sz)));
    tree.push_str(&text_box(
        3,
        "Content 2",
        body_frame(picture_ref.is_some()),
        &bullet_paragraphs(&slide.bullets, body_sz),
    ));
    if let Some((rel_id, frame)) = picture_ref {
        tree.push_str(&picture(4, rel_id, frame));
    }

    format!(
        r#"{XML_DECL}<p:sld {NS_PRESENTATION}><p:cSld><p:spTree>{tree}</p:spTree></p:cSld><p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#
    )
}

/// `ppt/slides/_rels/slideN.xml.rels`. The image, if any, is `rId2`.
pub(crate) fn slide_relationships(media_target: Option<&str>) -> String {
    let mut rels = vec![Relationship {
        id: "rId1",
        kind: "slideLayout",
        target: "../slideLayouts/slideLayout1.xml",
    }];
    if let Some(target) = media_target {
        rels.push(Relationship {
            id: "rId2",
            kind: "image",
            target,
        });
    }
    relationships(&rels)
}
