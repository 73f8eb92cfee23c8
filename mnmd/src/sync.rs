//! Sync driver (C8, §4.7).

use crate::codec;
use crate::config::{editor_anchor, EditorProtocol};
use crate::error::LibraryError;
use crate::fileid::FileId;
use crate::id_writer::rewrite_source;
use crate::model::Prompt;
use crate::note_body::format_note_body;
use crate::note_type;
use crate::parsers::{extract_card_contexts, prompt::generate_prompts};
use crate::remote::{CardTemplate, NoteFields, RemoteClient};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Per-file prompt outcome counts, aggregated by the CLI across files
/// (§4.7, §10).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SyncOutcome {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Runs the full per-file algorithm of §4.7 against an already-loaded
/// document: ensures the deck and note type exist, extracts and syncs
/// every prompt, sweeps orphaned notes, and returns the rewritten source
/// alongside the outcome counts. `document` should already have its
/// `mnmd_file_id` front matter ensured (C2) by the caller.
pub async fn sync_document(
    client: &dyn RemoteClient,
    document: &str,
    file_id: &FileId,
    file_path: &Path,
    deck: &str,
    default_tags: &[String],
    editor_protocol: EditorProtocol,
) -> Result<(String, SyncOutcome), LibraryError> {
    ensure_deck(client, deck).await?;
    ensure_note_type(client).await?;

    let file_tag = file_id.tag();
    let mut tags_list = vec![file_tag.clone()];
    tags_list.extend(default_tags.iter().cloned());

    let contexts = extract_card_contexts(document);
    let prompts: Vec<Prompt> = contexts
        .iter()
        .flat_map(|ctx| generate_prompts(ctx, file_path, document))
        .collect();

    let mut outcome = SyncOutcome::default();
    let mut seen = HashSet::new();
    let mut assigned = HashMap::new();
    let absolute_path = file_path.display().to_string();

    for prompt in &prompts {
        let text = format_note_body(&prompt.body_template, &prompt.primary, prompt.group_members.as_deref());
        let extra = prompt.primary.extra.clone().unwrap_or_default();
        let source = editor_anchor(editor_protocol, &absolute_path, prompt.line_number + 1);
        let mut fields = NoteFields::new();
        fields.insert("Text".to_string(), text);
        fields.insert("Extra".to_string(), extra);
        fields.insert("Source".to_string(), source);

        sync_one_prompt(
            client,
            prompt,
            &fields,
            deck,
            &file_tag,
            &tags_list,
            &mut outcome,
            &mut seen,
            &mut assigned,
        )
        .await;
    }

    sweep_orphans(client, &file_tag, &seen).await;

    let rewritten = rewrite_source(document, &assigned);
    Ok((rewritten, outcome))
}

#[allow(clippy::too_many_arguments)]
async fn sync_one_prompt(
    client: &dyn RemoteClient,
    prompt: &Prompt,
    fields: &NoteFields,
    deck: &str,
    file_tag: &str,
    tags_list: &[String],
    outcome: &mut SyncOutcome,
    seen: &mut HashSet<u64>,
    assigned: &mut HashMap<(String, usize), String>,
) {
    let existing_id = prompt
        .primary
        .note_id_code
        .as_deref()
        .and_then(|code| codec::decode(code).ok());

    if let Some(id) = existing_id {
        match client.notes_exist(&[id]).await {
            Ok(exists) if exists.first().copied().unwrap_or(false) => {
                match client.update_note_fields(id, fields).await {
                    Ok(()) => {
                        if let Err(e) = client.add_tags(&[id], file_tag).await {
                            log::warn!("failed to tag note {id}: {e}");
                        }
                        seen.insert(id);
                        outcome.updated += 1;
                    }
                    Err(e) => {
                        log::warn!("update failed for note {id}: {e}");
                        outcome.skipped += 1;
                    }
                }
                return;
            }
            Ok(_) => {
                log::debug!("note {id} no longer exists remotely; creating a new one");
            }
            Err(e) => {
                log::warn!("could not query note {id}: {e}");
                outcome.skipped += 1;
                return;
            }
        }
    }

    match client.add_note(deck, note_type::NOTE_TYPE_NAME, fields, tags_list).await {
        Ok(id) => {
            let code = codec::encode(id);
            record_assigned_code(prompt, &code, assigned);
            log::info!("created note {id} for {}:{}", prompt.file_path.display(), prompt.line_number);
            seen.insert(id);
            outcome.created += 1;
        }
        Err(e) => {
            log::warn!("create failed: {e}");
            outcome.skipped += 1;
        }
    }
}

fn record_assigned_code(prompt: &Prompt, code: &str, assigned: &mut HashMap<(String, usize), String>) {
    assigned.insert(
        (prompt.primary.full_text.clone(), prompt.primary.line_number),
        code.to_string(),
    );
    if let Some(members) = &prompt.group_members {
        for member in members {
            assigned.insert((member.full_text.clone(), member.line_number), code.to_string());
        }
    }
}

async fn ensure_deck(client: &dyn RemoteClient, deck: &str) -> Result<(), LibraryError> {
    let decks = client.deck_names().await?;
    if !decks.iter().any(|d| d == deck) {
        client.create_deck(deck).await?;
    }
    Ok(())
}

async fn ensure_note_type(client: &dyn RemoteClient) -> Result<(), LibraryError> {
    let models = client.model_names().await?;
    let mut template = CardTemplate::new();
    template.insert("Front".to_string(), note_type::CARD_TEMPLATE_FRONT.to_string());
    template.insert("Back".to_string(), note_type::CARD_TEMPLATE_BACK.to_string());

    if models.iter().any(|m| m == note_type::NOTE_TYPE_NAME) {
        client
            .update_model_styling(note_type::NOTE_TYPE_NAME, note_type::NOTE_TYPE_CSS)
            .await?;
        let template_names = client.model_template_names(note_type::NOTE_TYPE_NAME).await?;
        if let Some(name) = template_names.first() {
            client
                .update_model_templates(note_type::NOTE_TYPE_NAME, name, &template)
                .await?;
        }
    } else {
        let fields: Vec<String> = note_type::NOTE_TYPE_FIELDS.iter().map(|f| (*f).to_string()).collect();
        client
            .create_model(note_type::NOTE_TYPE_NAME, &fields, &template, note_type::NOTE_TYPE_CSS)
            .await?;
    }
    Ok(())
}

/// Deletes every note tagged `file_tag` whose ID was not recorded in
/// `seen` this run; best-effort (§4.7 step 6, §7).
async fn sweep_orphans(client: &dyn RemoteClient, file_tag: &str, seen: &HashSet<u64>) {
    match client.find_notes(&format!("tag:{file_tag}")).await {
        Ok(remote_ids) => {
            let orphans: Vec<u64> = remote_ids.into_iter().filter(|id| !seen.contains(id)).collect();
            if orphans.is_empty() {
                return;
            }
            match client.delete_notes(&orphans).await {
                Ok(()) => log::info!("deleted {} orphaned note(s)", orphans.len()),
                Err(e) => log::warn!("failed to delete orphaned notes: {e}"),
            }
        }
        Err(e) => log::warn!("could not enumerate notes for orphan sweep: {e}"),
    }
}
