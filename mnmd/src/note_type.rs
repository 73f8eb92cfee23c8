//! The remote note type's name, fields, CSS, and card template (§4.7 step
//! 2, §10). These strings are carried over verbatim from the reference
//! implementation's note-type constants, since §4.7 binds their existence
//! and shape but the distilled specification does not reproduce their
//! literal text.

/// Name of the cloze note type this crate ensures exists remotely.
pub const NOTE_TYPE_NAME: &str = "MNMD Cloze";

/// Field names, in order, the note type is created with.
pub const NOTE_TYPE_FIELDS: [&str; 3] = ["Text", "Extra", "Source"];

pub const NOTE_TYPE_CSS: &str = r#"
.card {
    font-family: arial;
    font-size: 20px;
    text-align: center;
    color: black;
    background-color: white;
}

.cloze {
    font-weight: bold;
    color: blue;
}

.nightMode .card {
    color: white;
    background-color: #2f2f31;
}

.source {
    font-size: 12px;
    color: #888;
    margin-top: 20px;
}

.nightMode .source {
    color: #aaa;
}

.extra {
    font-size: 12px;
    color: #666;
    margin-top: 20px;
    border-top: 1px solid #ccc;
    padding-top: 15px;
}

.nightMode .extra {
    color: #999;
    border-top-color: #555;
}

ul, ol {
    text-align: left;
    display: inline-block;
}

code {
    background-color: #f4f4f4;
    padding: 2px 4px;
    border-radius: 3px;
    font-family: monospace;
}

.nightMode code {
    background-color: #444;
}

pre {
    background-color: #f4f4f4;
    padding: 10px;
    border-radius: 5px;
    text-align: left;
    overflow-x: auto;
}

.nightMode pre {
    background-color: #444;
}

img {
    max-width: 100%;
    height: auto;
}
"#;

pub const CARD_TEMPLATE_FRONT: &str = r#"
{{cloze:Text}}

{{#Extra}}
<div class="extra">{{Extra}}</div>
{{/Extra}}
"#;

pub const CARD_TEMPLATE_BACK: &str = r#"
{{cloze:Text}}

{{#Extra}}
<div class="extra">{{Extra}}</div>
{{/Extra}}

{{#Source}}
<div class="source">{{Source}}</div>
{{/Source}}
"#;
