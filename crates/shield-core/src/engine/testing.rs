use crate::core::transport::engine::{TransportEngine, TransportError};
use crate::core::transport::model::TransportModel;
use crate::core::transport::tally::RawTallies;
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy)]
pub enum Script {
    /// Every bin of the spectrum holds this flux.
    Uniform(f64),
    FailExecute,
    FailRead,
    Panic,
}

/// In-memory engine whose behaviour is chosen per call by a function of the run id.
pub struct ScriptedEngine {
    script: Box<dyn Fn(&str) -> Script>,
    pub executions: Cell<usize>,
    pub workdirs: RefCell<Vec<PathBuf>>,
}

impl ScriptedEngine {
    pub fn new(script: impl Fn(&str) -> Script + 'static) -> Self {
        Self {
            script: Box::new(script),
            executions: Cell::new(0),
            workdirs: RefCell::new(Vec::new()),
        }
    }

    pub fn always(script: Script) -> Self {
        Self::new(move |_| script)
    }
}

impl TransportEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn execute(&self, model: &TransportModel, workdir: &Path) -> Result<(), TransportError> {
        self.executions.set(self.executions.get() + 1);
        self.workdirs.borrow_mut().push(workdir.to_path_buf());
        match (self.script)(&model.run_id) {
            Script::FailExecute => Err(TransportError::Engine("scripted failure".to_string())),
            Script::Panic => panic!("scripted panic for {}", model.run_id),
            _ => Ok(()),
        }
    }

    fn read_tallies(
        &self,
        model: &TransportModel,
        _workdir: &Path,
    ) -> Result<RawTallies, TransportError> {
        match (self.script)(&model.run_id) {
            Script::Uniform(flux) => {
                let [nx, ny, _] = model.tallies.mesh.dimension;
                Ok(RawTallies {
                    detector_spectrum: vec![flux; model.tallies.detector.bin_count()],
                    mesh_flux: vec![vec![flux; ny]; nx],
                })
            }
            _ => Err(TransportError::MissingOutput {
                path: PathBuf::from("tallies.json"),
            }),
        }
    }
}
