//! Concrete AnkiConnect adapter (C14, §6): the `reqwest`-backed
//! implementation of [`mnmd::RemoteClient`] the CLI binds the sync driver
//! to. Request/response shapes follow AnkiConnect's own JSON-RPC-over-HTTP
//! convention (`{action, version, params}` / `{result, error}`).

use async_trait::async_trait;
use mnmd::error::{ConnectionErrorKind, RemoteApiErrorKind};
use mnmd::remote::{CardTemplate, NoteFields, RemoteClient};
use mnmd::LibraryError;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};

const ANKI_CONNECT_VERSION: u32 = 6;

pub struct AnkiConnectClient {
    url: String,
    http: Client,
}

impl AnkiConnectClient {
    #[must_use]
    pub fn new(url: String) -> Self {
        Self {
            url,
            http: Client::new(),
        }
    }

    async fn invoke(&self, action: &str, params: Option<Value>) -> Result<Value, LibraryError> {
        #[derive(Serialize)]
        struct Envelope {
            action: String,
            version: u32,
            #[serde(skip_serializing_if = "Option::is_none")]
            params: Option<Value>,
        }
        let body = Envelope {
            action: action.to_string(),
            version: ANKI_CONNECT_VERSION,
            params,
        };

        let response = self.http.post(&self.url).json(&body).send().await.map_err(|e| {
            LibraryError::Connection(ConnectionErrorKind::Unreachable {
                url: self.url.clone(),
                message: e.to_string(),
            })
        })?;

        let parsed: Value = response.json().await.map_err(|_| {
            LibraryError::RemoteApi(RemoteApiErrorKind::MalformedResponse {
                action: action.to_string(),
            })
        })?;

        match parsed.get("error") {
            None | Some(Value::Null) => {}
            Some(other) => {
                return Err(LibraryError::RemoteApi(RemoteApiErrorKind::Custom {
                    action: action.to_string(),
                    message: other.to_string(),
                }));
            }
        }
        parsed.get("result").cloned().ok_or_else(|| {
            LibraryError::RemoteApi(RemoteApiErrorKind::MalformedResponse {
                action: action.to_string(),
            })
        })
    }
}

fn from_value<T: DeserializeOwned>(value: Value, action: &str) -> Result<T, LibraryError> {
    serde_json::from_value(value).map_err(|_| {
        LibraryError::RemoteApi(RemoteApiErrorKind::MalformedResponse {
            action: action.to_string(),
        })
    })
}

#[async_trait]
impl RemoteClient for AnkiConnectClient {
    async fn model_names(&self) -> Result<Vec<String>, LibraryError> {
        let result = self.invoke("modelNames", None).await?;
        from_value(result, "modelNames")
    }

    async fn create_model(
        &self,
        model_name: &str,
        fields: &[String],
        template: &CardTemplate,
        css: &str,
    ) -> Result<(), LibraryError> {
        let card_templates = vec![json!({
            "Name": model_name,
            "Front": template.get("Front").cloned().unwrap_or_default(),
            "Back": template.get("Back").cloned().unwrap_or_default(),
        })];
        let params = json!({
            "modelName": model_name,
            "inOrderFields": fields,
            "css": css,
            "cardTemplates": card_templates,
        });
        self.invoke("createModel", Some(params)).await?;
        Ok(())
    }

    async fn update_model_styling(&self, model_name: &str, css: &str) -> Result<(), LibraryError> {
        let params = json!({"model": {"name": model_name, "css": css}});
        self.invoke("updateModelStyling", Some(params)).await?;
        Ok(())
    }

    async fn model_template_names(&self, model_name: &str) -> Result<Vec<String>, LibraryError> {
        let params = json!({"modelName": model_name});
        let result = self.invoke("modelTemplates", Some(params)).await?;
        let map: serde_json::Map<String, Value> = from_value(result, "modelTemplates")?;
        Ok(map.keys().cloned().collect())
    }

    async fn update_model_templates(
        &self,
        model_name: &str,
        template_name: &str,
        template: &CardTemplate,
    ) -> Result<(), LibraryError> {
        let templates = json!({ template_name: {
            "Front": template.get("Front").cloned().unwrap_or_default(),
            "Back": template.get("Back").cloned().unwrap_or_default(),
        }});
        let params = json!({"model": {"name": model_name, "templates": templates}});
        self.invoke("updateModelTemplates", Some(params)).await?;
        Ok(())
    }

    async fn deck_names(&self) -> Result<Vec<String>, LibraryError> {
        let result = self.invoke("deckNames", None).await?;
        from_value(result, "deckNames")
    }

    async fn create_deck(&self, deck_name: &str) -> Result<(), LibraryError> {
        let params = json!({"deck": deck_name});
        self.invoke("createDeck", Some(params)).await?;
        Ok(())
    }

    async fn add_note(
        &self,
        deck: &str,
        model: &str,
        fields: &NoteFields,
        tags: &[String],
    ) -> Result<u64, LibraryError> {
        let params = json!({
            "note": {
                "deckName": deck,
                "modelName": model,
                "fields": fields,
                "tags": tags,
            }
        });
        let result = self.invoke("addNote", Some(params)).await?;
        from_value(result, "addNote")
    }

    async fn update_note_fields(&self, note_id: u64, fields: &NoteFields) -> Result<(), LibraryError> {
        let params = json!({"note": {"id": note_id, "fields": fields}});
        self.invoke("updateNoteFields", Some(params)).await?;
        Ok(())
    }

    async fn notes_exist(&self, note_ids: &[u64]) -> Result<Vec<bool>, LibraryError> {
        let params = json!({"notes": note_ids});
        let result = self.invoke("notesInfo", Some(params)).await?;
        let infos: Vec<Value> = from_value(result, "notesInfo")?;
        Ok(infos
            .iter()
            .map(|info| info.as_object().is_some_and(|m| !m.is_empty()))
            .collect())
    }

    async fn find_notes(&self, query: &str) -> Result<Vec<u64>, LibraryError> {
        let params = json!({"query": query});
        let result = self.invoke("findNotes", Some(params)).await?;
        from_value(result, "findNotes")
    }

    async fn add_tags(&self, note_ids: &[u64], tags: &str) -> Result<(), LibraryError> {
        let params = json!({"notes": note_ids, "tags": tags});
        self.invoke("addTags", Some(params)).await?;
        Ok(())
    }

    async fn delete_notes(&self, note_ids: &[u64]) -> Result<(), LibraryError> {
        let params = json!({"notes": note_ids});
        self.invoke("deleteNotes", Some(params)).await?;
        Ok(())
    }
}
