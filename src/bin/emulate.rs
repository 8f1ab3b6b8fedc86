//! Manual smoke-test CLI: compiles a `TxScript` source file and dry-runs
//! it through `alephium-emulator` against a file-backed world state.
//!
//! There is no real chain behind this: the single sharding group it
//! serves is backed by one RocksDB directory, and the dummy input it
//! feeds the script carries whatever ALF amount `--input-alf` says.

use alephium::{
    compile_script_source, emulate, BlockFlowView, ChainIndex, CompilerConfig, CompilerEnv,
    GroupIndex, PersistedRoot, TxInput, WorldState,
};
use alephium_core::{Address, U256};
use alephium_persistence::RocksStore;
use alephium_vm::{AssetOutput, BlockEnv, IOError};
use clap::Parser;
use std::path::PathBuf;
use std::rc::Rc;

#[derive(Parser, Debug)]
#[command(name = "alephium-emulate", about = "Dry-run a TxScript against a file-backed world state")]
struct Cli {
    /// Path to a source file containing a single `TxScript` definition.
    script: PathBuf,

    /// Directory backing the file-backed world state.
    #[arg(long, default_value = "./alephium-emulate-db")]
    db_path: PathBuf,

    /// ALF amount the dry run's single dummy input is assumed to carry.
    #[arg(long, default_value_t = 1_000_000)]
    input_alf: u64,

    /// Gas limit to report in the dry run's transaction template. The
    /// execution itself always runs against the protocol's maximal
    /// per-transaction gas ceiling regardless of this value.
    #[arg(long)]
    gas_limit: Option<u64>,

    /// Gas price to report in the dry run's transaction template.
    #[arg(long)]
    gas_price: Option<u64>,
}

struct SingleGroupFileChain {
    store: Rc<RocksStore>,
}

impl SingleGroupFileChain {
    fn open(path: &std::path::Path) -> anyhow::Result<Self> {
        Ok(Self {
            store: Rc::new(RocksStore::open(path)?),
        })
    }
}

impl BlockFlowView for SingleGroupFileChain {
    type Store = RocksStore;

    fn get_dryrun_block_env(&self, _chain_index: ChainIndex) -> Result<BlockEnv, IOError> {
        Ok(BlockEnv {
            chain_id: 1,
            timestamp: 0,
            difficulty_target: 0,
            hard_fork_identifier: 0,
        })
    }

    fn get_mutable_group_view_including_pool(
        &mut self,
        _group: GroupIndex,
    ) -> Result<WorldState<RocksStore>, IOError> {
        Ok(WorldState::open(PersistedRoot::default(), self.store.clone()))
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let src = std::fs::read_to_string(&cli.script)?;
    let config = CompilerConfig::default();
    let env = CompilerEnv::default();
    let script = compile_script_source(&src, &config, &env)?;

    let mut chain = SingleGroupFileChain::open(&cli.db_path)?;
    let input = TxInput { output_ref: [0u8; 32] };
    let output = AssetOutput {
        lockup_script: Address::zero(),
        alf_amount: U256::from_u64(cli.input_alf),
        tokens: vec![],
    };

    let result = emulate(
        &mut chain,
        vec![(input, output)],
        vec![],
        &script,
        cli.gas_limit,
        cli.gas_price.map(U256::from_u64),
    )?;

    println!("gas used: {}", result.gas_used);
    println!("return values: {:?}", result.return_values);
    for (event_id, fields) in &result.emitted_logs {
        println!("log {:?}: {:?}", event_id, fields);
    }

    Ok(())
}
