use bdd_bridge::{BddOp, Manager, ManagerConfig};

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Debug,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let mgr = Manager::new();
    let (one, zero) = mgr.initialize(&ManagerConfig::default())?;
    println!("mgr = {:?}", mgr);
    println!("one = {:?}, zero = {:?}", one, zero);

    mgr.ensure_variable_count(4)?;
    let mut x = Vec::new();
    for i in 0..4 {
        x.push(mgr.ith_variable(i)?.ok_or_else(|| color_eyre::eyre::eyre!("no variable {}", i))?);
    }
    println!("x = {:?}", x);

    let f = mgr.apply(&x[0], &x[1], BddOp::And)?;
    println!("f = x0 & x1 = {:?}, {} nodes, {} models", f, f.node_count()?, f.sat_count()?);

    let s = mgr.sat_one(&f)?;
    println!("sat_one(f) = {:?}", s);

    let table = mgr.allocate_pairing()?;
    table.set_variable(1, 3)?;
    let g = mgr.replace(&f, &table)?;
    println!("f[x1 := x3] = {:?}, support = {:?}", g, mgr.support(&g)?);

    let h = mgr.apply(&f, &g, BddOp::Imp)?;
    println!("f -> g = {:?}, sat_one = {:?}", h, mgr.sat_one(&h)?);

    println!("mgr = {:?}, {} live nodes", mgr, mgr.node_count()?);
    drop((f, g, h, s, table, x));
    mgr.shutdown()?;

    Ok(())
}
