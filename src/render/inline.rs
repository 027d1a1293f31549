//! Inline run rendering.
//!
//! Style flags are independent, so one run can carry several at once.
//! Delimiters stack in a single fixed nesting order, innermost to
//! outermost: code, strikethrough, italic, bold, color span, link.
//! Stripping the markup always recovers the raw text unchanged.

use crate::blocks::{Mention, RichText, RichTextVariant};

pub fn render_runs(runs: &[RichText]) -> String {
    runs.iter().map(render_run).collect()
}

fn render_run(run: &RichText) -> String {
    match &run.variant {
        RichTextVariant::Mention { mention } => return render_mention(run, mention),
        RichTextVariant::Equation { equation } => {
            let body = format!("${}$", equation.expression);
            return match &run.href {
                Some(href) => format!("[{body}]({href})"),
                None => body,
            };
        }
        RichTextVariant::Text { .. } | RichTextVariant::Other => {}
    }

    let mut out = run.plain_text.clone();
    if out.is_empty() {
        return out;
    }

    let a = &run.annotations;
    if a.code {
        out = format!("`{out}`");
    }
    if a.strikethrough {
        out = format!("~~{out}~~");
    }
    if a.italic {
        out = format!("*{out}*");
    }
    if a.bold {
        out = format!("**{out}**");
    }
    if let Some(color) = a.color_tag() {
        out = format!("<span data-color=\"{color}\">{out}</span>");
    }
    if let Some(href) = &run.href {
        out = format!("[{out}]({href})");
    }
    out
}

fn render_mention(run: &RichText, mention: &Mention) -> String {
    match mention {
        Mention::Page { .. } => match &run.href {
            Some(href) => format!("[{}]({})", run.plain_text, href),
            None => run.plain_text.clone(),
        },
        Mention::User { user } => {
            let name = user
                .name
                .clone()
                .unwrap_or_else(|| run.plain_text.trim_start_matches('@').to_string());
            format!("@{name}")
        }
        Mention::Date { date } => {
            if date.start.is_empty() {
                run.plain_text.clone()
            } else {
                match &date.end {
                    Some(end) => format!("{} - {}", date.start, end),
                    None => date.start.clone(),
                }
            }
        }
        Mention::Other => run.plain_text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::make;
    use crate::blocks::{Annotations, DateValue, PageRef, RichTextVariant, UserRef};

    fn flags(f: impl FnOnce(&mut Annotations)) -> Annotations {
        let mut a = Annotations::default();
        f(&mut a);
        a
    }

    #[test]
    fn plain_run_passes_through() {
        assert_eq!(render_runs(&[make::run("hello")]), "hello");
    }

    #[test]
    fn single_flags() {
        assert_eq!(
            render_runs(&[make::styled("b", flags(|a| a.bold = true))]),
            "**b**"
        );
        assert_eq!(
            render_runs(&[make::styled("i", flags(|a| a.italic = true))]),
            "*i*"
        );
        assert_eq!(
            render_runs(&[make::styled("s", flags(|a| a.strikethrough = true))]),
            "~~s~~"
        );
        assert_eq!(
            render_runs(&[make::styled("c", flags(|a| a.code = true))]),
            "`c`"
        );
    }

    #[test]
    fn combined_flags_stack_in_fixed_order() {
        let run = make::styled(
            "x",
            flags(|a| {
                a.bold = true;
                a.italic = true;
                a.code = true;
            }),
        );
        assert_eq!(render_runs(&[run]), "***`x`***");
    }

    #[test]
    fn color_wraps_outside_styles() {
        let run = make::styled(
            "warm",
            flags(|a| {
                a.bold = true;
                a.color = "red".to_string();
            }),
        );
        assert_eq!(
            render_runs(&[run]),
            "<span data-color=\"red\">**warm**</span>"
        );
    }

    #[test]
    fn link_is_outermost() {
        let mut run = make::linked("docs", "https://example.com");
        run.annotations.bold = true;
        assert_eq!(render_runs(&[run]), "[**docs**](https://example.com)");
    }

    #[test]
    fn stripped_markup_recovers_original_text() {
        let runs = vec![
            make::styled("one ", flags(|a| a.bold = true)),
            make::styled("two", flags(|a| a.italic = true)),
            make::run(" three"),
        ];
        let rendered = render_runs(&runs);
        let stripped: String = rendered.chars().filter(|c| !"*~`".contains(*c)).collect();
        assert_eq!(stripped, "one two three");
    }

    #[test]
    fn page_mention_links() {
        let mut run = make::run("Other post");
        run.href = Some("https://notion.so/abc".to_string());
        run.variant = RichTextVariant::Mention {
            mention: Mention::Page {
                page: PageRef { id: "abc".into() },
            },
        };
        assert_eq!(
            render_runs(&[run]),
            "[Other post](https://notion.so/abc)"
        );
    }

    #[test]
    fn user_mention_is_an_at_name() {
        let mut run = make::run("@Anna");
        run.variant = RichTextVariant::Mention {
            mention: Mention::User {
                user: UserRef {
                    id: "u1".into(),
                    name: Some("Anna".into()),
                },
            },
        };
        assert_eq!(render_runs(&[run]), "@Anna");
    }

    #[test]
    fn date_mention_is_the_raw_date() {
        let mut run = make::run("May 1");
        run.variant = RichTextVariant::Mention {
            mention: Mention::Date {
                date: DateValue {
                    start: "2024-05-01".into(),
                    end: None,
                },
            },
        };
        assert_eq!(render_runs(&[run]), "2024-05-01");
    }
}
