//! Scripted investigation assistant for the side panel.
//!
//! Replies are canned text chosen from the selected entity's description;
//! the panel reveals them progressively through a [`Typewriter`].

use serde_json::Value;

use crate::graph::Properties;

/// What the assistant is told about the selected entity.
#[derive(Clone, Debug, PartialEq)]
pub struct EntityDescription {
	/// Node or edge id. Edges use `source->target`.
	pub id: String,
	/// Heading of the side panel.
	pub title: String,
	/// Primary label for nodes, `Relationship` for edges.
	pub entity_type: String,
	/// Entity properties.
	pub properties: Properties,
	/// Any risk flag raised on a node.
	pub risky: bool,
}

impl EntityDescription {
	fn property_text(&self, key: &str) -> Option<String> {
		match self.properties.get(key)? {
			Value::String(s) if !s.is_empty() => Some(s.clone()),
			Value::Number(n) => Some(n.to_string()),
			_ => None,
		}
	}
}

/// Canned actions offered under every selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuickAction {
	/// Risk level summary.
	RiskAssessment,
	/// Recent transaction list.
	ShowTransactions,
	/// Similar-entity search.
	FindSimilar,
	/// Suspicious-activity report draft.
	SuspiciousActivityReport,
}

impl QuickAction {
	/// Every action, in panel order.
	pub const ALL: [QuickAction; 4] = [
		QuickAction::RiskAssessment,
		QuickAction::ShowTransactions,
		QuickAction::FindSimilar,
		QuickAction::SuspiciousActivityReport,
	];

	/// Button caption, also echoed as the user's message.
	pub fn label(self) -> &'static str {
		match self {
			QuickAction::RiskAssessment => "Risk assessment",
			QuickAction::ShowTransactions => "Show transactions",
			QuickAction::FindSimilar => "Find similar nodes",
			QuickAction::SuspiciousActivityReport => "Generate SAR report",
		}
	}
}

/// A user turn.
#[derive(Clone, Debug, PartialEq)]
pub enum Prompt {
	/// One of the canned actions.
	Quick(QuickAction),
	/// Free text typed into the panel.
	Text(String),
}

impl Prompt {
	/// Text shown as the user's message.
	pub fn text(&self) -> &str {
		match self {
			Prompt::Quick(action) => action.label(),
			Prompt::Text(text) => text,
		}
	}
}

/// Produces reply text for a prompt about an entity.
pub trait Assistant: Send + Sync {
	/// Full reply; the caller decides how to reveal it.
	fn respond(&self, entity: &EntityDescription, prompt: &Prompt) -> String;
}

/// Fixed replies, independent of any analytics.
#[derive(Clone, Debug, Default)]
pub struct ScriptedAssistant;

/// FNV-1a, used to give each entity a stable report number.
fn report_number(id: &str) -> u32 {
	let hash = id
		.bytes()
		.fold(0x811c_9dc5u32, |h, b| {
			(h ^ b as u32).wrapping_mul(0x0100_0193)
		});
	hash % 1_000_000
}

impl Assistant for ScriptedAssistant {
	fn respond(&self, entity: &EntityDescription, prompt: &Prompt) -> String {
		match prompt {
			Prompt::Quick(QuickAction::RiskAssessment) if entity.risky => format!(
				"Risk level: HIGH\n\n{} carries risk markers: flagged status, suspicious \
				 activity or exposure to a high-risk jurisdiction. Escalate for enhanced \
				 due diligence.",
				entity.title
			),
			Prompt::Quick(QuickAction::RiskAssessment) => format!(
				"Risk level: LOW\n\n{} shows no risk markers in the loaded graph. Routine \
				 monitoring is sufficient.",
				entity.title
			),
			Prompt::Quick(QuickAction::ShowTransactions) => "Recent transfers (last 30 days):\n\n\
				 £15,000  15 Jan  SWIFT\n\
				 £8,000   12 Jan  SWIFT\n\
				 £5,000   10 Jan  Faster Payment\n\
				 £12,500  08 Jan  SWIFT\n\n\
				 Total: £40,500 across 4 transfers"
				.to_string(),
			Prompt::Quick(QuickAction::FindSimilar) => "Similarity search is not available yet. \
				 It will compare transaction patterns, shared counterparties and risk profiles."
				.to_string(),
			Prompt::Quick(QuickAction::SuspiciousActivityReport) => {
				let subject = entity
					.property_text("name")
					.unwrap_or_else(|| entity.id.clone());
				let account = entity
					.property_text("accountNumber")
					.unwrap_or_else(|| entity.id.clone());
				format!(
					"SUSPICIOUS ACTIVITY REPORT\n\n\
					 Report: SAR-{:06}\n\
					 Subject: {subject}\n\
					 Account: {account}\n\n\
					 NARRATIVE:\n\
					 High-value transfers to high-risk jurisdictions over a short period, \
					 well above the account's usual velocity, without supporting \
					 documentation.\n\n\
					 ACTIONS:\n\
					 Enhanced monitoring enabled. Regulatory notification pending review.",
					report_number(&entity.id)
				)
			}
			Prompt::Text(_) => format!(
				"I'm looking at this {}. Ask about its risk, connected entities, \
				 transaction patterns or compliance concerns.",
				entity.entity_type
			),
		}
	}
}

/// Reveals text a few characters at a time.
#[derive(Clone, Debug)]
pub struct Typewriter {
	chars: Vec<char>,
	pos: usize,
	seed: u32,
}

impl Typewriter {
	pub const MIN_CHUNK: usize = 2;
	pub const MAX_CHUNK: usize = 4;

	pub fn new(text: &str) -> Self {
		Self::with_seed(text, text.len() as u32 | 1)
	}

	pub fn with_seed(text: &str, seed: u32) -> Self {
		Self {
			chars: text.chars().collect(),
			pos: 0,
			seed,
		}
	}

	pub fn is_done(&self) -> bool {
		self.pos >= self.chars.len()
	}
}

impl Iterator for Typewriter {
	type Item = String;

	fn next(&mut self) -> Option<String> {
		if self.is_done() {
			return None;
		}
		self.seed = self
			.seed
			.wrapping_mul(1_664_525)
			.wrapping_add(1_013_904_223);
		let span = Self::MAX_CHUNK - Self::MIN_CHUNK + 1;
		let size = Self::MIN_CHUNK + (self.seed >> 16) as usize % span;
		let end = (self.pos + size).min(self.chars.len());
		let chunk = self.chars[self.pos..end].iter().collect();
		self.pos = end;
		Some(chunk)
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
	User,
	Assistant,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Message {
	pub role: Role,
	pub content: String,
	pub streaming: bool,
}

/// Exchange history about the selected entity.
///
/// Every reset bumps the epoch; chunks tagged with an older epoch belong to
/// a discarded exchange and are dropped.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Conversation {
	messages: Vec<Message>,
	epoch: u64,
}

impl Conversation {
	pub fn messages(&self) -> &[Message] {
		&self.messages
	}

	pub fn epoch(&self) -> u64 {
		self.epoch
	}

	/// A reply is still being typed.
	pub fn is_busy(&self) -> bool {
		self.messages.last().is_some_and(|m| m.streaming)
	}

	pub fn reset(&mut self) {
		self.messages.clear();
		self.epoch += 1;
	}

	/// Appends the user's turn and an empty streaming reply. Returns the
	/// epoch to tag chunks with, or `None` while a reply is streaming.
	pub fn begin(&mut self, prompt: &Prompt) -> Option<u64> {
		if self.is_busy() {
			return None;
		}
		self.messages.push(Message {
			role: Role::User,
			content: prompt.text().to_string(),
			streaming: false,
		});
		self.messages.push(Message {
			role: Role::Assistant,
			content: String::new(),
			streaming: true,
		});
		Some(self.epoch)
	}

	fn streaming_reply(&mut self, epoch: u64) -> Option<&mut Message> {
		if epoch != self.epoch {
			return None;
		}
		self.messages
			.last_mut()
			.filter(|m| m.role == Role::Assistant && m.streaming)
	}

	/// Appends a chunk to the streaming reply. `false` once the exchange is stale.
	pub fn stream(&mut self, epoch: u64, chunk: &str) -> bool {
		match self.streaming_reply(epoch) {
			Some(reply) => {
				reply.content.push_str(chunk);
				true
			}
			None => false,
		}
	}

	/// Marks the streaming reply complete.
	pub fn finish(&mut self, epoch: u64) -> bool {
		match self.streaming_reply(epoch) {
			Some(reply) => {
				reply.streaming = false;
				true
			}
			None => false,
		}
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn entity(risky: bool) -> EntityDescription {
		let mut properties = Properties::new();
		properties.insert("name".into(), json!("Jane Smith"));
		EntityDescription {
			id: "c1".into(),
			title: "Jane Smith".into(),
			entity_type: "Customer".into(),
			properties,
			risky,
		}
	}

	#[test]
	fn risk_reply_depends_on_flags() {
		let assistant = ScriptedAssistant;
		let prompt = Prompt::Quick(QuickAction::RiskAssessment);
		let risky = assistant.respond(&entity(true), &prompt);
		assert!(risky.starts_with("Risk level: HIGH"));
		let routine = assistant.respond(&entity(false), &prompt);
		assert!(routine.starts_with("Risk level: LOW"));
	}

	#[test]
	fn report_names_the_subject_and_is_stable() {
		let assistant = ScriptedAssistant;
		let prompt = Prompt::Quick(QuickAction::SuspiciousActivityReport);
		let first = assistant.respond(&entity(true), &prompt);
		assert!(first.contains("Subject: Jane Smith"));
		assert!(first.contains("Account: c1"));
		assert_eq!(first, assistant.respond(&entity(true), &prompt));
	}

	#[test]
	fn free_text_mentions_the_entity_type() {
		let prompt = Prompt::Text("who is this?".into());
		let reply = ScriptedAssistant.respond(&entity(false), &prompt);
		assert!(reply.contains("this Customer"));
	}

	#[test]
	fn typewriter_chunks_reassemble_the_reply() {
		let text = "Risk level: LOW. Routine monitoring applies.";
		let chunks: Vec<String> = Typewriter::new(text).collect();
		assert_eq!(chunks.concat(), text);
		let (last, rest) = chunks.split_last().unwrap();
		let sizes = Typewriter::MIN_CHUNK..=Typewriter::MAX_CHUNK;
		assert!(rest.iter().all(|c| sizes.contains(&c.chars().count())));
		assert!(last.chars().count() <= Typewriter::MAX_CHUNK);
	}

	#[test]
	fn exchanges_do_not_overlap() {
		let mut conversation = Conversation::default();
		let epoch = conversation
			.begin(&Prompt::Quick(QuickAction::FindSimilar))
			.unwrap();
		assert!(conversation.is_busy());
		assert_eq!(conversation.begin(&Prompt::Text("again".into())), None);
		assert!(conversation.stream(epoch, "Simi"));
		assert!(conversation.finish(epoch));
		assert!(!conversation.is_busy());
		assert_eq!(conversation.messages()[0].content, "Find similar nodes");
		assert_eq!(conversation.messages()[1].content, "Simi");
		assert!(conversation.begin(&Prompt::Text("again".into())).is_some());
	}

	#[test]
	fn reset_drops_late_chunks() {
		let mut conversation = Conversation::default();
		let epoch = conversation.begin(&Prompt::Text("hi".into())).unwrap();
		conversation.reset();
		assert!(!conversation.stream(epoch, "late"));
		assert!(!conversation.finish(epoch));
		assert!(conversation.messages().is_empty());
		assert!(!conversation.is_busy());
	}
}
