//! In-memory object heap.
//!
//! `Heap` stores a program state as plain data and answers both interpreter
//! traits over it. A host can load one from a JSON snapshot to mirror a
//! running program; tests build one programmatically.
//!
//! Message sends resolve to a small set of natives (position rounding, event
//! queueing and flushing) or to property getters over field slots.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{
    Field, GAME_FQN, IO_FQN, Import, InnerValue, Interpreter, NamedObject, ObjectGraph,
    PackageScope, RuntimeError, short_name,
};
use crate::types::{Id, SoundStatus};

pub const NULL_ID: &str = "null";
pub const POSITION_MODULE: &str = "wollok.game.Position";
pub const SOUND_MODULE: &str = "wollok.game.Sound";

const GAME_PACKAGE: &str = "wollok.game";
const LANG_PACKAGE: &str = "wollok.lang";
const EVENT_QUEUE: &str = "eventQueue";
const MAX_PRINT_DEPTH: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeapObject {
    pub module: String,
    #[serde(default)]
    pub inner: InnerValue,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<Field>,
    /// Overrides the print string (dates, ranges, closures...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl HeapObject {
    fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// An event drained from the io queue by `flushEvents`.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchedEvent {
    pub time: f64,
    pub event: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Heap {
    objects: BTreeMap<Id, HeapObject>,
    #[serde(default)]
    well_known: BTreeMap<String, Id>,
    #[serde(default)]
    packages: Vec<PackageScope>,
    #[serde(default)]
    repl: Vec<Field>,
    #[serde(skip)]
    next_id: u64,
    #[serde(skip)]
    dispatched: Vec<DispatchedEvent>,
    #[serde(skip)]
    executed: Vec<String>,
}

impl Heap {
    pub fn new() -> Self {
        let mut heap = Heap::default();
        heap.ensure_null();
        heap
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        let mut heap: Heap = serde_json::from_str(json)?;
        heap.ensure_null();
        Ok(heap)
    }

    fn ensure_null(&mut self) {
        self.objects.entry(NULL_ID.to_string()).or_insert(HeapObject {
            module: String::new(),
            inner: InnerValue::Null,
            fields: Vec::new(),
            display: None,
        });
    }

    pub fn alloc(&mut self, object: HeapObject) -> Id {
        let id = loop {
            self.next_id += 1;
            let candidate = format!("#{}", self.next_id);
            if !self.objects.contains_key(&candidate) {
                break candidate;
            }
        };
        self.objects.insert(id.clone(), object);
        id
    }

    pub fn null(&self) -> Id {
        NULL_ID.to_string()
    }

    pub fn string(&mut self, value: &str) -> Id {
        self.reify(InnerValue::String(value.to_string()))
    }

    pub fn number(&mut self, value: f64) -> Id {
        self.reify(InnerValue::Number(value))
    }

    pub fn boolean(&mut self, value: bool) -> Id {
        self.reify(InnerValue::Boolean(value))
    }

    pub fn set(&mut self, elements: Vec<Id>) -> Id {
        self.reify(InnerValue::Set(elements))
    }

    /// A built-in object shown through a fixed print string.
    pub fn literal(&mut self, module: &str, display: &str) -> Id {
        self.alloc(HeapObject {
            module: module.to_string(),
            inner: InnerValue::Object,
            fields: Vec::new(),
            display: Some(display.to_string()),
        })
    }

    pub fn instance(&mut self, module: &str, fields: &[(&str, Id)]) -> Id {
        self.alloc(HeapObject {
            module: module.to_string(),
            inner: InnerValue::Object,
            fields: fields
                .iter()
                .map(|(name, value)| Field {
                    name: name.to_string(),
                    value: value.clone(),
                    constant: false,
                })
                .collect(),
            display: None,
        })
    }

    /// Declare a well-known object named `name` inside `package`.
    pub fn declare_object(&mut self, package: &str, name: &str, fields: &[(&str, Id)]) -> Id {
        let fqn = format!("{package}.{name}");
        let id = self.instance(&fqn, fields);
        self.well_known.insert(fqn, id.clone());
        self.package_mut(package).objects.push(NamedObject {
            name: name.to_string(),
            id: id.clone(),
        });
        id
    }

    pub fn import(&mut self, package: &str, imported: &str, member: Option<&str>) {
        self.package_mut(package).imports.push(Import {
            package: imported.to_string(),
            member: member.map(str::to_string),
        });
    }

    pub fn declare_program(&mut self, package: &str, name: &str) {
        let fqn = format!("{package}.{name}");
        self.package_mut(package).programs.push(fqn);
    }

    fn package_mut(&mut self, name: &str) -> &mut PackageScope {
        let index = match self.packages.iter().position(|p| p.name == name) {
            Some(index) => index,
            None => {
                self.packages.push(PackageScope {
                    name: name.to_string(),
                    ..Default::default()
                });
                self.packages.len() - 1
            }
        };
        &mut self.packages[index]
    }

    pub fn set_field(&mut self, object: &Id, name: &str, value: Id) -> Result<(), RuntimeError> {
        self.put_field(object, name, value, false)
    }

    pub fn set_constant(&mut self, object: &Id, name: &str, value: Id) -> Result<(), RuntimeError> {
        self.put_field(object, name, value, true)
    }

    fn put_field(
        &mut self,
        object: &Id,
        name: &str,
        value: Id,
        constant: bool,
    ) -> Result<(), RuntimeError> {
        let target = self
            .objects
            .get_mut(object)
            .ok_or_else(|| RuntimeError::DanglingReference(object.clone()))?;
        match target.fields.iter_mut().find(|f| f.name == name) {
            Some(field) => {
                field.value = value;
                field.constant = constant;
            }
            None => target.fields.push(Field {
                name: name.to_string(),
                value,
                constant,
            }),
        }
        Ok(())
    }

    pub fn bind_repl(&mut self, name: &str, value: Id, constant: bool) {
        self.repl.retain(|b| b.name != name);
        self.repl.push(Field {
            name: name.to_string(),
            value,
            constant,
        });
    }

    pub fn position(&mut self, x: f64, y: f64) -> Id {
        let x = self.number(x);
        let y = self.number(y);
        self.instance(POSITION_MODULE, &[("x", x), ("y", y)])
    }

    /// Install the game and io singletons with an empty, running board.
    pub fn install_game(&mut self, width: f64, height: f64, cell_size: f64, ground: &str) -> Id {
        let running = self.boolean(true);
        let visuals = self.list(Vec::new());
        let sounds = self.list(Vec::new());
        let width = self.number(width);
        let height = self.number(height);
        let cell_size = self.number(cell_size);
        let ground = self.string(ground);
        let game = self.declare_object(
            GAME_PACKAGE,
            short_name(GAME_FQN),
            &[
                ("running", running),
                ("visuals", visuals),
                ("sounds", sounds),
                ("width", width),
                ("height", height),
                ("cellSize", cell_size),
                ("ground", ground),
            ],
        );
        let queue = self.list(Vec::new());
        self.declare_object(LANG_PACKAGE, short_name(IO_FQN), &[(EVENT_QUEUE, queue)]);
        game
    }

    pub fn add_visual(&mut self, visual: Id) -> Result<(), RuntimeError> {
        self.push_to_game_collection("visuals", visual)
    }

    pub fn add_sound(&mut self, sound: Id) -> Result<(), RuntimeError> {
        self.push_to_game_collection("sounds", sound)
    }

    pub fn remove_sound(&mut self, sound: &Id) -> Result<(), RuntimeError> {
        let sounds = self.game_collection("sounds")?;
        if let Some(HeapObject {
            inner: InnerValue::List(elements),
            ..
        }) = self.objects.get_mut(&sounds)
        {
            elements.retain(|e| e != sound);
        }
        Ok(())
    }

    pub fn sound(&mut self, file: &str, status: SoundStatus, volume: f64, looped: bool) -> Id {
        let file = self.string(file);
        let status = self.string(status_name(status));
        let volume = self.number(volume);
        let looped = self.boolean(looped);
        self.instance(
            SOUND_MODULE,
            &[("file", file), ("status", status), ("volume", volume), ("loop", looped)],
        )
    }

    /// Replace a field's value with a freshly reified built-in.
    pub fn assign(
        &mut self,
        object: &Id,
        name: &str,
        value: InnerValue,
    ) -> Result<(), RuntimeError> {
        let value = self.reify(value);
        self.set_field(object, name, value)
    }

    pub fn dispatched(&self) -> &[DispatchedEvent] {
        &self.dispatched
    }

    pub fn executed_programs(&self) -> &[String] {
        &self.executed
    }

    fn game_collection(&self, name: &str) -> Result<Id, RuntimeError> {
        let game = self.object(GAME_FQN)?;
        self.get(&game, name).ok_or_else(|| RuntimeError::BadField {
            field: name.to_string(),
            expected: "collection",
        })
    }

    fn push_to_game_collection(&mut self, name: &str, element: Id) -> Result<(), RuntimeError> {
        let collection = self.game_collection(name)?;
        match self.objects.get_mut(&collection) {
            Some(HeapObject {
                inner: InnerValue::List(elements),
                ..
            }) => {
                elements.push(element);
                Ok(())
            }
            _ => Err(RuntimeError::BadField {
                field: name.to_string(),
                expected: "list",
            }),
        }
    }

    fn lookup(&self, object: &Id) -> Result<&HeapObject, RuntimeError> {
        self.objects
            .get(object)
            .ok_or_else(|| RuntimeError::DanglingReference(object.clone()))
    }

    fn number_field(&self, object: &Id, field: &str) -> Result<f64, RuntimeError> {
        self.get(object, field)
            .and_then(|value| self.inner_number(&value))
            .ok_or_else(|| RuntimeError::BadField {
                field: field.to_string(),
                expected: "number",
            })
    }

    fn is_well_known(&self, object: &Id, fqn: &str) -> bool {
        self.well_known.get(fqn) == Some(object)
    }

    fn queue_event(&mut self, io: &Id, event: &Id) -> Result<Id, RuntimeError> {
        let queue = self.get(io, EVENT_QUEUE).ok_or_else(|| RuntimeError::BadField {
            field: EVENT_QUEUE.to_string(),
            expected: "list",
        })?;
        if let Some(HeapObject {
            inner: InnerValue::List(elements),
            ..
        }) = self.objects.get_mut(&queue)
        {
            elements.push(event.clone());
        }
        Ok(self.null())
    }

    fn flush_events(&mut self, ms: &Id) -> Result<Id, RuntimeError> {
        let time = self.inner_number(ms).ok_or_else(|| RuntimeError::BadField {
            field: "ms".to_string(),
            expected: "number",
        })?;
        let io = self.object(IO_FQN)?;
        let mut drained = Vec::new();
        if let Some(queue) = self.get(&io, EVENT_QUEUE) {
            if let Some(HeapObject {
                inner: InnerValue::List(elements),
                ..
            }) = self.objects.get_mut(&queue)
            {
                drained = std::mem::take(elements);
            }
        }
        for event in drained {
            let parts = self
                .inner_collection(&event)
                .unwrap_or_default()
                .iter()
                .filter_map(|part| self.inner_string(part))
                .collect();
            self.dispatched.push(DispatchedEvent { time, event: parts });
        }
        Ok(self.null())
    }

    fn print_at_depth(&self, object: &Id, depth: usize) -> String {
        let Some(heap_object) = self.objects.get(object) else {
            return "?".to_string();
        };
        if let Some(display) = &heap_object.display {
            return display.clone();
        }
        let join = |elements: &[Id]| {
            if depth >= MAX_PRINT_DEPTH {
                return "...".to_string();
            }
            elements
                .iter()
                .map(|e| self.print_at_depth(e, depth + 1))
                .collect::<Vec<_>>()
                .join(", ")
        };
        match &heap_object.inner {
            InnerValue::Null => "null".to_string(),
            InnerValue::String(s) => format!("\"{s}\""),
            InnerValue::Number(n) => format_number(*n),
            InnerValue::Boolean(b) => b.to_string(),
            InnerValue::List(elements) => format!("[{}]", join(elements)),
            InnerValue::Set(elements) => format!("#{{{}}}", join(elements)),
            InnerValue::Object => match self.well_known_name(object) {
                Some(name) => name,
                None => format!("a {}", short_name(&heap_object.module)),
            },
        }
    }
}

fn status_name(status: SoundStatus) -> &'static str {
    match status {
        SoundStatus::Played => "played",
        SoundStatus::Paused => "paused",
        SoundStatus::Stopped => "stopped",
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn module_of(inner: &InnerValue) -> &'static str {
    match inner {
        InnerValue::Null | InnerValue::Object => "",
        InnerValue::Number(_) => "wollok.lang.Number",
        InnerValue::String(_) => "wollok.lang.String",
        InnerValue::Boolean(_) => "wollok.lang.Boolean",
        InnerValue::List(_) => super::LIST_MODULE,
        InnerValue::Set(_) => super::SET_MODULE,
    }
}

impl Interpreter for Heap {
    fn object(&self, fqn: &str) -> Result<Id, RuntimeError> {
        self.well_known
            .get(fqn)
            .cloned()
            .ok_or_else(|| RuntimeError::MissingObject(fqn.to_string()))
    }

    fn get(&self, object: &Id, field: &str) -> Option<Id> {
        self.objects
            .get(object)
            .and_then(|o| o.field(field))
            .map(|f| f.value.clone())
    }

    fn inner(&self, object: &Id) -> InnerValue {
        self.objects
            .get(object)
            .map(|o| o.inner.clone())
            .unwrap_or_default()
    }

    fn responds_to(&self, object: &Id, selector: &str, arity: usize) -> bool {
        let Some(heap_object) = self.objects.get(object) else {
            return false;
        };
        match (heap_object.module.as_str(), selector, arity) {
            (POSITION_MODULE, "round", 0) => true,
            (_, "flushEvents", 1) => self.is_well_known(object, GAME_FQN),
            (_, "queueEvent", 1) => self.is_well_known(object, IO_FQN),
            (_, _, 0) => heap_object.field(selector).is_some(),
            _ => false,
        }
    }

    fn send(&mut self, selector: &str, receiver: &Id, args: &[Id]) -> Result<Id, RuntimeError> {
        let heap_object = self.lookup(receiver)?;
        if heap_object.inner == InnerValue::Null {
            return Err(RuntimeError::Raised(format!(
                "Reference is not initialized: cannot send {selector} to null"
            )));
        }
        let module = heap_object.module.clone();
        let getter = heap_object.field(selector).map(|f| f.value.clone());
        match (module.as_str(), selector, args) {
            (POSITION_MODULE, "round", []) => {
                let x = self.number_field(receiver, "x")?;
                let y = self.number_field(receiver, "y")?;
                Ok(self.position(x.round(), y.round()))
            }
            (_, "flushEvents", [ms]) if self.is_well_known(receiver, GAME_FQN) => {
                self.flush_events(ms)
            }
            (_, "queueEvent", [event]) if self.is_well_known(receiver, IO_FQN) => {
                self.queue_event(receiver, event)
            }
            (_, _, []) if getter.is_some() => Ok(getter.unwrap_or_default()),
            _ => Err(RuntimeError::MessageNotUnderstood {
                module: module.clone(),
                selector: selector.to_string(),
                arity: args.len(),
            }),
        }
    }

    fn reify(&mut self, value: InnerValue) -> Id {
        if value == InnerValue::Null {
            return self.null();
        }
        let module = module_of(&value).to_string();
        self.alloc(HeapObject {
            module,
            inner: value,
            fields: Vec::new(),
            display: None,
        })
    }

    fn program_in(&self, package: &str) -> Option<String> {
        self.packages
            .iter()
            .find(|p| p.name == package)
            .and_then(|p| p.programs.first().cloned())
    }

    fn exec_program(&mut self, program: &str) -> Result<(), RuntimeError> {
        let declared = self
            .packages
            .iter()
            .any(|p| p.programs.iter().any(|name| name == program));
        if !declared {
            return Err(RuntimeError::MissingProgram(program.to_string()));
        }
        log::debug!("executing program {program}");
        self.executed.push(program.to_string());
        Ok(())
    }
}

impl ObjectGraph for Heap {
    fn module_fqn(&self, object: &Id) -> Option<String> {
        self.objects
            .get(object)
            .filter(|o| o.inner != InnerValue::Null)
            .map(|o| o.module.clone())
    }

    fn fields(&self, object: &Id) -> Vec<Field> {
        self.objects
            .get(object)
            .map(|o| o.fields.clone())
            .unwrap_or_default()
    }

    fn elements(&self, object: &Id) -> Option<Vec<Id>> {
        self.inner_collection(object)
    }

    fn well_known_name(&self, object: &Id) -> Option<String> {
        self.well_known
            .iter()
            .find(|(_, id)| *id == object)
            .map(|(fqn, _)| short_name(fqn).to_string())
    }

    fn print_string(&self, object: &Id) -> String {
        self.print_at_depth(object, 0)
    }

    fn package(&self, fqn: &str) -> Option<PackageScope> {
        self.packages.iter().find(|p| p.name == fqn).cloned()
    }

    fn repl_bindings(&self) -> Vec<Field> {
        self.repl.clone()
    }
}
