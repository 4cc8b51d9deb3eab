// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use maud::DOCTYPE;
use maud::Markup;
use maud::html;

use crate::history::tracker::YearStats;

fn page_template(title: &str, body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                style { (STYLE) }
            }
            body {
                (body)
            }
        }
    }
}

const STYLE: &str = "body { font-family: sans-serif; max-width: 40rem; margin: 2rem auto; } \
                     table { border-collapse: collapse; } \
                     td, th { padding: 0.25rem 0.75rem; text-align: right; }";

pub fn stats_page(current: &YearStats, sent: &[String], years: &[YearStats]) -> Markup {
    let body = html! {
        h1 { "Daily Verse" }
        h2 { "Year " (current.year) }
        p {
            (current.used) " of " (current.total) " verses sent ("
            (format!("{:.1}", current.completion_percent)) "%), "
            (current.unused) " remaining."
        }
        @if !sent.is_empty() {
            h3 { "Sent this year" }
            ul {
                @for reference in sent {
                    li { (reference) }
                }
            }
        }
        h2 { "All years" }
        @if years.is_empty() {
            p { "No history yet." }
        } @else {
            table {
                thead {
                    tr {
                        th { "Year" }
                        th { "Sent" }
                        th { "Remaining" }
                        th { "Complete" }
                    }
                }
                tbody {
                    @for stats in years {
                        tr {
                            td { (stats.year) }
                            td { (stats.used) "/" (stats.total) }
                            td { (stats.unused) }
                            td { (format!("{:.1}%", stats.completion_percent)) }
                        }
                    }
                }
            }
        }
    };
    page_template("Daily Verse", body)
}

pub fn not_found_page() -> Markup {
    page_template("Not Found", html! { p { "Not Found" } })
}
