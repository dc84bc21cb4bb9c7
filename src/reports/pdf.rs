//! Paginated PDF rendering of the prepared report rows.
//!
//! Layout is a greedy top-to-bottom flow: a vertical cursor tracks emitted
//! content height and a new page starts whenever the next block (day header
//! or transaction row) would overflow the printable area. Rows are never
//! split across pages. Placement is computed by a pure planner so the
//! page-break behavior can be tested without parsing PDF output.

use std::fs::File;

use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    calculate_points_for_circle, calculate_points_for_rect, BuiltinFont, Color, IndirectFontRef,
    Line, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference, Point, Polygon, Rgb,
};
use time::OffsetDateTime;
use tracing::warn;

use crate::models::TxnKind;
use crate::reports::data::{
    format_amount, group_by_day, initials, long_date, short_date, totals, DayGroup, ReportRow,
};

// All positions in millimeters from the top-left corner; converted to PDF
// bottom-left coordinates only at draw time.
const PAGE_W: f64 = 210.0;
const PAGE_H: f64 = 297.0;
const MARGIN: f64 = 14.0;
const HEADER_H: f64 = 34.0;
const SUMMARY_H: f64 = 46.0;
const DAY_HEADER_H: f64 = 10.0;
const ROW_H: f64 = 15.0;

const PT_TO_MM: f64 = 0.352_778;

const INDIGO: (f64, f64, f64) = (0.31, 0.27, 0.90);
const WHITE: (f64, f64, f64) = (1.0, 1.0, 1.0);
const GREEN: (f64, f64, f64) = (0.09, 0.64, 0.29);
const RED: (f64, f64, f64) = (0.86, 0.15, 0.15);
const GREEN_TINT: (f64, f64, f64) = (0.85, 0.95, 0.88);
const RED_TINT: (f64, f64, f64) = (0.99, 0.89, 0.89);
const INK: (f64, f64, f64) = (0.13, 0.15, 0.19);
const GRAY: (f64, f64, f64) = (0.42, 0.45, 0.50);
const PILL: (f64, f64, f64) = (0.93, 0.94, 0.95);
const RULE: (f64, f64, f64) = (0.89, 0.90, 0.92);

/// Layout arithmetic stays in f64; printpdf's units are f32, so values are
/// narrowed only at the draw boundary.
fn mm(v: f64) -> Mm {
    Mm(v as f32)
}

/// Printable bottom edge.
fn page_limit() -> f64 {
    PAGE_H - MARGIN
}

/// Whether a block of `needed` height fits below `cursor` on the current page.
fn fits(cursor: f64, needed: f64) -> bool {
    cursor + needed <= page_limit()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BlockKind {
    DayHeader,
    Row,
}

#[derive(Debug, Clone, Copy)]
struct Placed {
    page: usize,
    top: f64,
    kind: BlockKind,
    group: usize,
    /// Row index within the group; unused for day headers.
    row: usize,
    last_in_group: bool,
}

/// Greedy flow with page-break-on-overflow. `first_top` is the cursor
/// position after the header band and summary card on the first page;
/// continuation pages start at the top margin.
fn plan_layout(groups: &[DayGroup], first_top: f64) -> Vec<Placed> {
    let mut placed = Vec::new();
    let mut page = 0usize;
    let mut cursor = first_top;

    let push = |page: &mut usize, cursor: &mut f64, needed: f64| {
        if !fits(*cursor, needed) {
            *page += 1;
            *cursor = MARGIN;
        }
        let top = *cursor;
        *cursor += needed;
        top
    };

    for (g, group) in groups.iter().enumerate() {
        let top = push(&mut page, &mut cursor, DAY_HEADER_H);
        placed.push(Placed {
            page,
            top,
            kind: BlockKind::DayHeader,
            group: g,
            row: 0,
            last_in_group: false,
        });

        let count = group.rows.len();
        for r in 0..count {
            let top = push(&mut page, &mut cursor, ROW_H);
            placed.push(Placed {
                page,
                top,
                kind: BlockKind::Row,
                group: g,
                row: r,
                last_in_group: r + 1 == count,
            });
        }
    }

    placed
}

/// Rough Helvetica advance width; good enough for right alignment and pill
/// sizing without real font metrics.
fn approx_text_width(text: &str, size_pt: f64) -> f64 {
    text.chars().count() as f64 * size_pt * 0.53 * PT_TO_MM
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Whether the embedded font can render the rupee sign.
    rupee: bool,
}

/// Loads the configured TTF, falling back to the built-in Helvetica pair.
/// The fallback cannot encode `₹`, so amounts are prefixed with `Rs.` then.
fn load_fonts(doc: &PdfDocumentReference, font_path: Option<&str>) -> anyhow::Result<Fonts> {
    if let Some(path) = font_path {
        match File::open(path).map_err(anyhow::Error::from).and_then(|f| {
            doc.add_external_font(f).map_err(anyhow::Error::from)
        }) {
            Ok(font) => {
                return Ok(Fonts {
                    regular: font.clone(),
                    bold: font,
                    rupee: true,
                })
            }
            Err(e) => {
                warn!(error = %e, path, "report font unavailable, using built-in font");
            }
        }
    }
    Ok(Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold)?,
        rupee: false,
    })
}

struct Painter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
}

impl Painter {
    fn rgb(c: (f64, f64, f64)) -> Color {
        Color::Rgb(Rgb::new(c.0 as f32, c.1 as f32, c.2 as f32, None))
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(mm(PAGE_W), mm(PAGE_H), "content");
        self.layer = self.doc.get_page(page).get_layer(layer);
    }

    fn fill(&self, points: Vec<(Point, bool)>, color: (f64, f64, f64)) {
        self.layer.set_fill_color(Self::rgb(color));
        self.layer.add_polygon(Polygon {
            rings: vec![points],
            mode: PaintMode::Fill,
            winding_order: WindingOrder::NonZero,
        });
    }

    fn fill_rect(&self, x: f64, top: f64, w: f64, h: f64, color: (f64, f64, f64)) {
        let points = calculate_points_for_rect(
            mm(w),
            mm(h),
            mm(x + w / 2.0),
            mm(PAGE_H - top - h / 2.0),
        );
        self.fill(points, color);
    }

    fn fill_circle(&self, cx: f64, cy_top: f64, radius: f64, color: (f64, f64, f64)) {
        let points = calculate_points_for_circle(mm(radius), mm(cx), mm(PAGE_H - cy_top));
        self.fill(points, color);
    }

    fn stroke(&self, from: (f64, f64), to: (f64, f64), thickness: f64, color: (f64, f64, f64)) {
        self.layer.set_outline_color(Self::rgb(color));
        self.layer.set_outline_thickness(thickness as f32);
        self.layer.add_line(Line {
            points: vec![
                (Point::new(mm(from.0), mm(PAGE_H - from.1)), false),
                (Point::new(mm(to.0), mm(PAGE_H - to.1)), false),
            ],
            is_closed: false,
        });
    }

    fn hline(&self, x1: f64, x2: f64, top: f64, color: (f64, f64, f64)) {
        self.stroke((x1, top), (x2, top), 0.4, color);
    }

    /// Draws `text` with its baseline `top` millimeters from the page top.
    fn text(
        &self,
        text: &str,
        size: f64,
        x: f64,
        top: f64,
        font: &IndirectFontRef,
        color: (f64, f64, f64),
    ) {
        self.layer.set_fill_color(Self::rgb(color));
        self.layer
            .use_text(text, size as f32, mm(x), mm(PAGE_H - top), font);
    }

    fn text_right(
        &self,
        text: &str,
        size: f64,
        right: f64,
        top: f64,
        font: &IndirectFontRef,
        color: (f64, f64, f64),
    ) {
        let x = right - approx_text_width(text, size);
        self.text(text, size, x, top, font, color);
    }
}

fn currency_prefix(rupee: bool) -> &'static str {
    if rupee {
        "\u{20B9}"
    } else {
        "Rs. "
    }
}

fn signed_amount(rupee: bool, kind: TxnKind, amount: f64) -> String {
    let sign = match kind {
        TxnKind::Income => "+",
        TxnKind::Expense => "-",
    };
    format!("{sign}{}{}", currency_prefix(rupee), format_amount(amount))
}

/// Renders the full report and returns the finished document bytes.
pub fn render_pdf(rows: &[ReportRow], font_path: Option<&str>) -> anyhow::Result<Vec<u8>> {
    let (income, expense) = totals(rows);
    let balance = income - expense;
    let today = OffsetDateTime::now_utc().date();

    let (doc, page, layer) =
        PdfDocument::new("Financial Report", mm(PAGE_W), mm(PAGE_H), "content");
    let fonts = load_fonts(&doc, font_path)?;
    let mut painter = Painter {
        layer: doc.get_page(page).get_layer(layer),
        doc,
    };
    let cur = currency_prefix(fonts.rupee);

    // Header band.
    painter.fill_rect(0.0, 0.0, PAGE_W, HEADER_H, INDIGO);
    painter.text("Financial Report", 19.0, MARGIN, 16.0, &fonts.bold, WHITE);
    painter.text(
        &format!("Generated on {}", long_date(today)),
        9.5,
        MARGIN,
        24.0,
        &fonts.regular,
        WHITE,
    );

    // Summary card: balance banner over a two-column breakdown.
    let card_top = HEADER_H + 8.0;
    let banner_color = if balance >= 0.0 { GREEN } else { RED };
    painter.fill_rect(MARGIN, card_top, PAGE_W - 2.0 * MARGIN, 18.0, banner_color);
    painter.text(
        "Current Balance",
        8.5,
        MARGIN + 6.0,
        card_top + 7.0,
        &fonts.regular,
        WHITE,
    );
    let balance_text = if balance < 0.0 {
        format!("-{cur}{}", format_amount(-balance))
    } else {
        format!("{cur}{}", format_amount(balance))
    };
    painter.text(
        &balance_text,
        13.5,
        MARGIN + 6.0,
        card_top + 14.5,
        &fonts.bold,
        WHITE,
    );

    let split = PAGE_W / 2.0;
    let columns_top = card_top + 24.0;
    painter.text("Income", 8.5, MARGIN + 6.0, columns_top + 5.0, &fonts.regular, GRAY);
    painter.text(
        &format!("+{cur}{}", format_amount(income)),
        11.5,
        MARGIN + 6.0,
        columns_top + 12.0,
        &fonts.bold,
        GREEN,
    );
    painter.text("Expense", 8.5, split + 6.0, columns_top + 5.0, &fonts.regular, GRAY);
    painter.text(
        &format!("-{cur}{}", format_amount(expense)),
        11.5,
        split + 6.0,
        columns_top + 12.0,
        &fonts.bold,
        RED,
    );
    // Vertical divider between the two columns.
    painter.stroke(
        (split, columns_top),
        (split, columns_top + 16.0),
        0.5,
        RULE,
    );

    let first_top = card_top + SUMMARY_H + 6.0;
    let groups = group_by_day(rows.to_vec());

    if groups.is_empty() {
        painter.text(
            "No transactions for this period",
            10.0,
            MARGIN,
            first_top + 6.0,
            &fonts.regular,
            GRAY,
        );
    }

    let plan = plan_layout(&groups, first_top);
    let mut current_page = 0usize;

    for placed in &plan {
        while placed.page > current_page {
            painter.new_page();
            current_page += 1;
        }
        let group = &groups[placed.group];
        match placed.kind {
            BlockKind::DayHeader => {
                let label = long_date(group.date);
                let pill_w = approx_text_width(&label, 8.5) + 9.0;
                painter.fill_rect(MARGIN, placed.top + 2.0, pill_w, 6.5, PILL);
                painter.text(&label, 8.5, MARGIN + 4.5, placed.top + 6.8, &fonts.bold, INK);
            }
            BlockKind::Row => {
                let row = &group.rows[placed.row];
                let (tint, tone) = match row.kind {
                    TxnKind::Income => (GREEN_TINT, GREEN),
                    TxnKind::Expense => (RED_TINT, RED),
                };

                let avatar_cx = MARGIN + 5.5;
                let avatar_cy = placed.top + 7.0;
                painter.fill_circle(avatar_cx, avatar_cy, 5.0, tint);
                let letters = initials(&row.category);
                painter.text(
                    &letters,
                    8.5,
                    avatar_cx - approx_text_width(&letters, 8.5) / 2.0,
                    avatar_cy + 1.5,
                    &fonts.bold,
                    tone,
                );

                let text_x = MARGIN + 14.0;
                painter.text(&row.category, 10.0, text_x, placed.top + 6.0, &fonts.bold, INK);
                let notes = row.notes.as_deref().unwrap_or("No description");
                painter.text(notes, 8.0, text_x, placed.top + 11.5, &fonts.regular, GRAY);

                let right = PAGE_W - MARGIN;
                painter.text_right(
                    &signed_amount(fonts.rupee, row.kind, row.amount),
                    10.5,
                    right,
                    placed.top + 6.0,
                    &fonts.bold,
                    tone,
                );
                painter.text_right(
                    &short_date(row.occurred_at.date()),
                    7.5,
                    right,
                    placed.top + 11.5,
                    &fonts.regular,
                    GRAY,
                );

                if !placed.last_in_group {
                    painter.hline(text_x, right, placed.top + ROW_H - 1.0, RULE);
                }
            }
        }
    }

    // Footer caption, emitted once at the bottom of the final page.
    let caption = "Generated by Fintrack";
    painter.text(
        caption,
        7.5,
        (PAGE_W - approx_text_width(caption, 7.5)) / 2.0,
        PAGE_H - 7.0,
        &fonts.regular,
        GRAY,
    );

    let bytes = painter.doc.save_to_bytes()?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::data::sample_row;
    use time::macros::datetime;
    use time::Duration;

    fn many_rows(count: usize) -> Vec<ReportRow> {
        let start = datetime!(2025-08-01 12:00 UTC);
        (0..count)
            .map(|i| {
                sample_row(
                    if i % 2 == 0 { TxnKind::Expense } else { TxnKind::Income },
                    100.0 + i as f64,
                    start - Duration::hours(6 * i as i64),
                    "Shopping",
                )
            })
            .collect()
    }

    #[test]
    fn fits_is_exact_at_the_boundary() {
        let cursor = page_limit() - ROW_H;
        assert!(fits(cursor, ROW_H));
        assert!(!fits(cursor + 0.1, ROW_H));
    }

    #[test]
    fn no_row_is_ever_split_across_pages() {
        let groups = group_by_day(many_rows(200));
        let plan = plan_layout(&groups, HEADER_H + 8.0 + SUMMARY_H + 6.0);
        for p in &plan {
            let height = match p.kind {
                BlockKind::DayHeader => DAY_HEADER_H,
                BlockKind::Row => ROW_H,
            };
            assert!(p.top >= MARGIN, "block above content area");
            assert!(
                p.top + height <= page_limit() + 1e-4,
                "block extends past the printable area: top={} height={}",
                p.top,
                height
            );
        }
    }

    #[test]
    fn a_new_page_starts_exactly_on_overflow() {
        let groups = group_by_day(many_rows(200));
        let plan = plan_layout(&groups, HEADER_H + 8.0 + SUMMARY_H + 6.0);
        assert!(plan.last().unwrap().page > 0, "expected multiple pages");

        for pair in plan.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            if b.page == a.page + 1 {
                // The block that moved to a fresh page must not have fit
                // after its predecessor.
                let a_height = match a.kind {
                    BlockKind::DayHeader => DAY_HEADER_H,
                    BlockKind::Row => ROW_H,
                };
                let b_height = match b.kind {
                    BlockKind::DayHeader => DAY_HEADER_H,
                    BlockKind::Row => ROW_H,
                };
                assert!(!fits(a.top + a_height, b_height));
                assert_eq!(b.top, MARGIN);
            }
        }
    }

    #[test]
    fn scenario_groups_into_two_day_headers() {
        let rows = vec![
            sample_row(TxnKind::Income, 5000.0, datetime!(2025-08-12 10:00 UTC), "Salary"),
            sample_row(TxnKind::Expense, 2000.0, datetime!(2025-08-12 08:00 UTC), "Shopping"),
            sample_row(TxnKind::Expense, 1000.0, datetime!(2025-08-11 09:00 UTC), "Transport"),
        ];
        let groups = group_by_day(rows);
        let plan = plan_layout(&groups, HEADER_H + 8.0 + SUMMARY_H + 6.0);
        let headers = plan
            .iter()
            .filter(|p| p.kind == BlockKind::DayHeader)
            .count();
        assert_eq!(headers, 2);
        assert_eq!(plan.len(), 5);
    }

    #[test]
    fn rules_are_omitted_after_the_last_row_of_a_group() {
        let groups = group_by_day(many_rows(10));
        let plan = plan_layout(&groups, HEADER_H + 8.0 + SUMMARY_H + 6.0);
        for p in plan.iter().filter(|p| p.kind == BlockKind::Row) {
            let group = &groups[p.group];
            assert_eq!(p.last_in_group, p.row + 1 == group.rows.len());
        }
    }

    #[test]
    fn renders_a_valid_pdf_with_builtin_fonts() {
        let bytes = render_pdf(&many_rows(40), None).expect("render");
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 1000);
    }

    #[test]
    fn renders_an_empty_report() {
        let bytes = render_pdf(&[], None).expect("render empty");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn missing_font_path_falls_back_to_builtin() {
        let bytes = render_pdf(&many_rows(3), Some("/nonexistent/font.ttf")).expect("render");
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn amounts_are_signed_and_prefixed() {
        assert_eq!(signed_amount(true, TxnKind::Income, 5000.0), "+\u{20B9}5,000.00");
        assert_eq!(signed_amount(true, TxnKind::Expense, 150000.0), "-\u{20B9}1,50,000.00");
        // Built-in Helvetica cannot encode the rupee glyph, so the fallback
        // prefix stays ASCII.
        assert_eq!(signed_amount(false, TxnKind::Expense, 20.0), "-Rs. 20.00");
        assert!(currency_prefix(false).is_ascii());
    }
}
