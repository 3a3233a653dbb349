//! Semantic model of a sequence interaction.
//!
//! The interaction graph never owns or mutates the semantic model. It reads it
//! through the [`SemanticModel`] trait, which [`Interaction`] implements for
//! in-memory (and deserialized) snapshots.
//!
//! # Structure
//!
//! - [`Lifeline`] - A participant, with the ordered list of fragments covering it
//! - [`CoveringFragment`] - One entry of a lifeline's covering list
//! - [`Message`] - A message between two [`MessageEnd`]s
//! - [`Gate`] - A message end at an interaction or fragment boundary
//! - [`FragmentDef`] - An interaction use or combined fragment spanning lifelines
//!
//! The covering list of a lifeline is authoritative for temporal order on that
//! lifeline. Geometry only refines order *between* lifelines.

use serde::{Deserialize, Serialize};

use crate::identifier::Id;

/// The kind of communication a message represents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageSort {
    #[default]
    SynchCall,
    AsynchCall,
    AsynchSignal,
    Reply,
    CreateMessage,
    DeleteMessage,
}

/// One end of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageEnd {
    /// A message occurrence on a lifeline.
    Occurrence { occurrence: Id },

    /// A formal gate of the interaction or an actual gate of a fragment.
    Gate { gate: Id },

    /// The boundary of a fragment that declares no gate element for the message.
    Boundary { fragment: Id },

    /// The message is lost: it has no receiver.
    Lost,

    /// The message is found: it has no known sender.
    Found,
}

/// Which end of a message an occurrence or gate represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    Send,
    Receive,
}

impl MessageRole {
    /// Returns the role at the other end of the message.
    pub fn opposite(self) -> Self {
        match self {
            Self::Send => Self::Receive,
            Self::Receive => Self::Send,
        }
    }
}

/// An entry of a lifeline's covering list.
///
/// Covering lists are closed over these variants; every consumer matches them
/// exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CoveringFragment {
    /// The occurrence starting an execution specification.
    ExecutionStart { occurrence: Id, execution: Id },

    /// The occurrence finishing an execution specification.
    ExecutionFinish { occurrence: Id, execution: Id },

    /// The occurrence sending a message.
    MessageSend { occurrence: Id, message: Id },

    /// The occurrence receiving a message.
    MessageReceive { occurrence: Id, message: Id },

    /// Start of a multi-lifeline fragment on this lifeline.
    FragmentStart { fragment: Id },

    /// End of a multi-lifeline fragment on this lifeline.
    FragmentEnd { fragment: Id },
}

impl CoveringFragment {
    /// Returns the semantic element owning this entry: the execution, the
    /// message or the fragment.
    pub fn element(&self) -> Id {
        match self {
            Self::ExecutionStart { execution, .. } | Self::ExecutionFinish { execution, .. } => {
                *execution
            }
            Self::MessageSend { message, .. } | Self::MessageReceive { message, .. } => *message,
            Self::FragmentStart { fragment } | Self::FragmentEnd { fragment } => *fragment,
        }
    }
}

/// A participant of the interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lifeline {
    id: Id,
    #[serde(default)]
    covered_by: Vec<CoveringFragment>,
}

impl Lifeline {
    /// Creates a lifeline with an empty covering list.
    pub fn new(id: Id) -> Self {
        Self {
            id,
            covered_by: Vec::new(),
        }
    }

    /// Appends an entry to the covering list.
    pub fn with_covering(mut self, fragment: CoveringFragment) -> Self {
        self.covered_by.push(fragment);
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    /// Returns the covering list in temporal order.
    pub fn covered_by(&self) -> &[CoveringFragment] {
        &self.covered_by
    }
}

/// A message between two ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: Id,
    #[serde(default)]
    sort: MessageSort,
    send: MessageEnd,
    receive: MessageEnd,
}

impl Message {
    pub fn new(id: Id, sort: MessageSort, send: MessageEnd, receive: MessageEnd) -> Self {
        Self {
            id,
            sort,
            send,
            receive,
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn sort(&self) -> MessageSort {
        self.sort
    }

    pub fn send(&self) -> MessageEnd {
        self.send
    }

    pub fn receive(&self) -> MessageEnd {
        self.receive
    }

    /// Returns the end playing the given role.
    pub fn end(&self, role: MessageRole) -> MessageEnd {
        match role {
            MessageRole::Send => self.send,
            MessageRole::Receive => self.receive,
        }
    }
}

/// The owner of a gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GateOwner {
    /// A formal gate, owned by the interaction.
    Interaction,
    /// An actual gate, owned by an interaction use or combined fragment.
    Fragment(Id),
}

/// A message end at a structural boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fragment: Option<Id>,
}

impl Gate {
    /// Creates a formal gate owned by the interaction.
    pub fn formal(id: Id) -> Self {
        Self { id, fragment: None }
    }

    /// Creates an actual gate owned by `fragment`.
    pub fn actual(id: Id, fragment: Id) -> Self {
        Self {
            id,
            fragment: Some(fragment),
        }
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn owner(&self) -> GateOwner {
        match self.fragment {
            Some(fragment) => GateOwner::Fragment(fragment),
            None => GateOwner::Interaction,
        }
    }
}

/// The kind of a multi-lifeline fragment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FragmentKind {
    /// A reference to another interaction.
    #[default]
    InteractionUse,
    /// A combined fragment (alt, loop, par, ...).
    CombinedFragment,
}

/// An interaction use or combined fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FragmentDef {
    id: Id,
    #[serde(default)]
    kind: FragmentKind,
    covered: Vec<Id>,
    #[serde(default)]
    gates: Vec<Id>,
}

impl FragmentDef {
    pub fn new(id: Id, kind: FragmentKind, covered: Vec<Id>) -> Self {
        Self {
            id,
            kind,
            covered,
            gates: Vec::new(),
        }
    }

    /// Adds an actual gate to the fragment.
    pub fn with_gate(mut self, gate: Id) -> Self {
        self.gates.push(gate);
        self
    }

    pub fn id(&self) -> Id {
        self.id
    }

    pub fn kind(&self) -> FragmentKind {
        self.kind
    }

    /// Returns the lifelines the fragment covers.
    pub fn covered(&self) -> &[Id] {
        &self.covered
    }

    /// Returns the fragment's actual gates in declaration order.
    pub fn gates(&self) -> &[Id] {
        &self.gates
    }
}

/// Read access to an immutable, already validated interaction.
pub trait SemanticModel {
    /// Returns the id of the interaction itself.
    fn interaction(&self) -> Id;

    /// Returns the lifelines in semantic order.
    fn lifelines(&self) -> &[Lifeline];

    /// Returns the messages in semantic order.
    fn messages(&self) -> &[Message];

    /// Returns every gate, formal and actual.
    fn gates(&self) -> &[Gate];

    /// Returns the multi-lifeline fragments.
    fn fragments(&self) -> &[FragmentDef];

    fn lifeline(&self, id: Id) -> Option<&Lifeline> {
        self.lifelines().iter().find(|lifeline| lifeline.id() == id)
    }

    fn message(&self, id: Id) -> Option<&Message> {
        self.messages().iter().find(|message| message.id() == id)
    }

    fn gate(&self, id: Id) -> Option<&Gate> {
        self.gates().iter().find(|gate| gate.id() == id)
    }

    fn fragment(&self, id: Id) -> Option<&FragmentDef> {
        self.fragments().iter().find(|fragment| fragment.id() == id)
    }

    /// Returns the formal gates (owned by the interaction) in declaration order.
    fn formal_gates(&self) -> Vec<&Gate> {
        self.gates()
            .iter()
            .filter(|gate| gate.owner() == GateOwner::Interaction)
            .collect()
    }
}

/// An in-memory interaction snapshot.
///
/// # Examples
///
/// ```
/// use trellis_core::{identifier::Id, semantic::*};
///
/// let interaction = Interaction::new(Id::new("checkout"))
///     .with_lifeline(Lifeline::new(Id::new("client")).with_covering(
///         CoveringFragment::MessageSend {
///             occurrence: Id::new("s1"),
///             message: Id::new("order"),
///         },
///     ))
///     .with_lifeline(Lifeline::new(Id::new("shop")).with_covering(
///         CoveringFragment::MessageReceive {
///             occurrence: Id::new("r1"),
///             message: Id::new("order"),
///         },
///     ))
///     .with_message(Message::new(
///         Id::new("order"),
///         MessageSort::AsynchSignal,
///         MessageEnd::Occurrence { occurrence: Id::new("s1") },
///         MessageEnd::Occurrence { occurrence: Id::new("r1") },
///     ));
///
/// assert_eq!(interaction.lifelines().len(), 2);
/// assert!(interaction.message(Id::new("order")).is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    id: Id,
    #[serde(default)]
    lifelines: Vec<Lifeline>,
    #[serde(default)]
    messages: Vec<Message>,
    #[serde(default)]
    gates: Vec<Gate>,
    #[serde(default)]
    fragments: Vec<FragmentDef>,
}

impl Interaction {
    pub fn new(id: Id) -> Self {
        Self {
            id,
            lifelines: Vec::new(),
            messages: Vec::new(),
            gates: Vec::new(),
            fragments: Vec::new(),
        }
    }

    pub fn with_lifeline(mut self, lifeline: Lifeline) -> Self {
        self.lifelines.push(lifeline);
        self
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_gate(mut self, gate: Gate) -> Self {
        self.gates.push(gate);
        self
    }

    pub fn with_fragment(mut self, fragment: FragmentDef) -> Self {
        self.fragments.push(fragment);
        self
    }
}

impl SemanticModel for Interaction {
    fn interaction(&self) -> Id {
        self.id
    }

    fn lifelines(&self) -> &[Lifeline] {
        &self.lifelines
    }

    fn messages(&self) -> &[Message] {
        &self.messages
    }

    fn gates(&self) -> &[Gate] {
        &self.gates
    }

    fn fragments(&self) -> &[FragmentDef] {
        &self.fragments
    }
}
