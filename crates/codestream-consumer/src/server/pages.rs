//! HTML report pages

use std::fmt::Write;

use super::state::AppState;

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Clone report: statistics, last file timers, clones and processed files
pub fn clones_page(state: &AppState) -> String {
    let stats = state.statistics_summary();
    let mut page = String::from("<HTML><HEAD><TITLE>CodeStream Clone Detector</TITLE></HEAD>\n");
    page.push_str("<BODY><H1>CodeStream Clone Detector</H1>\n");
    page.push_str("<p><a href=\"/timers\">View detailed timers</a></p>\n");
    let _ = writeln!(
        page,
        "<P>Processed {} files containing {} clones.</P>",
        stats.files, stats.clones
    );

    if let Some(timers) = state.last_processed_timers() {
        page.push_str("<p>Timers for last file processed:</p>\n<ul>\n");
        for t in timers.iter() {
            let _ = writeln!(page, "<li>{}: {} µs", escape_html(&t.stage), t.micros());
        }
        page.push_str("</ul>\n");
    }

    for clone in state.list_clones() {
        page.push_str("<hr>\n");
        let _ = writeln!(page, "<h2>Source File: {}</h2>", escape_html(&clone.source_name));
        let _ = writeln!(
            page,
            "<p>Starting at line: {} , ending at line: {}</p>",
            clone.source_start_line, clone.source_end_line
        );
        page.push_str("<ul>");
        for target in &clone.targets {
            let _ = writeln!(
                page,
                "<li>Found in {} starting at line {}",
                escape_html(&target.name),
                target.start_line
            );
        }
        page.push_str("</ul>\n<h3>Contents:</h3>\n<pre><code>\n");
        page.push_str(&escape_html(&clone.original_code));
        page.push_str("</code></pre>\n");
    }

    page.push_str("<HR>\n<H2>Processed Files</H2>\n<ul>\n");
    for name in state.list_processed_files() {
        let _ = writeln!(page, "<li>{}", escape_html(&name));
    }
    page.push_str("</ul>\n</BODY></HTML>");
    page
}

/// Timing history: averages and one row per completed file
pub fn timers_page(state: &AppState) -> String {
    let mut page =
        String::from("<HTML><HEAD><TITLE>Timing Statistics</TITLE></HEAD><BODY><H1>Timing statistics</H1>");

    let rows = state.timing_history_rows();
    if rows.is_empty() {
        page.push_str("<p>No timing data yet.</p>");
    } else {
        let summary = state.timing_history_summary();
        let _ = write!(page, "<p>Average total µs: {}</p>", summary.avg_total_micros);
        let _ = write!(page, "<p>Average match µs: {}</p>", summary.avg_match_micros);
        let _ = write!(page, "<p>Average µs/line: {:.2}</p>", summary.avg_per_line_micros);

        page.push_str(
            "<table border=\"1\"><tr><th>File</th><th>Total (µs)</th><th>Match (µs)</th><th>µs/line</th></tr>",
        );
        for row in rows {
            let _ = write!(
                page,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.2}</td></tr>",
                escape_html(&row.file_name),
                row.total_micros(),
                row.match_micros(),
                row.per_line_cost()
            );
        }
        page.push_str("</table>");
    }

    page.push_str("</BODY></HTML>");
    page
}
