use crate::models::DailyRecord;

pub fn render_dashboard(date: &str, user_name: &str, record: &DailyRecord) -> String {
    let earnings = record
        .earnings
        .map(|value| format!("{value:.2}"))
        .unwrap_or_else(|| "--".to_string());
    let hours = record
        .hours_worked
        .map(|value| format!("{value:.1}"))
        .unwrap_or_else(|| "--".to_string());
    let break_label = if record.work_break.is_active {
        "Stop break"
    } else {
        "Start break"
    };

    DASHBOARD_HTML
        .replace("{{DATE}}", date)
        .replace("{{NAME}}", user_name)
        .replace("{{EARNINGS}}", &earnings)
        .replace("{{HOURS}}", &hours)
        .replace("{{BREAK_LABEL}}", break_label)
}

const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Freelance Tracker</title>
  <style>
    :root {
      --bg: #101418;
      --panel: #1a2027;
      --panel-edge: #262e38;
      --ink: #e8ecf1;
      --muted: #8b98a5;
      --accent: #4cc38a;
      --accent-2: #5ca8ff;
      --warn: #e5484d;
      --heat-0: #1c242d;
      --heat-1: #14452f;
      --heat-2: #1d6b43;
      --heat-3: #2c9a5d;
      --heat-4: #4cc38a;
    }

    * { box-sizing: border-box; }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Inter", "Segoe UI", sans-serif;
      padding: 28px 16px 48px;
      display: flex;
      justify-content: center;
    }

    .app {
      width: min(980px, 100%);
      display: grid;
      gap: 20px;
    }

    header {
      display: flex;
      flex-wrap: wrap;
      justify-content: space-between;
      align-items: baseline;
      gap: 8px;
    }

    h1 { margin: 0; font-size: 1.6rem; font-weight: 650; }
    h2 { margin: 0 0 12px; font-size: 1.05rem; font-weight: 600; }

    .who { color: var(--muted); font-size: 0.95rem; }

    .cards {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(160px, 1fr));
      gap: 12px;
    }

    .card {
      background: var(--panel);
      border: 1px solid var(--panel-edge);
      border-radius: 12px;
      padding: 14px 16px;
    }

    .card .label {
      display: block;
      font-size: 0.75rem;
      text-transform: uppercase;
      letter-spacing: 0.1em;
      color: var(--muted);
      margin-bottom: 6px;
    }

    .card .value { font-size: 1.45rem; font-weight: 650; }
    .card .value.money { color: var(--accent); }

    .panel {
      background: var(--panel);
      border: 1px solid var(--panel-edge);
      border-radius: 14px;
      padding: 18px;
    }

    .form-grid {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(190px, 1fr));
      gap: 14px;
    }

    .field { display: grid; gap: 5px; }
    .field label { font-size: 0.82rem; color: var(--muted); }

    input[type="number"], select {
      background: var(--bg);
      color: var(--ink);
      border: 1px solid var(--panel-edge);
      border-radius: 8px;
      padding: 8px 10px;
      font-size: 0.95rem;
    }

    .checks { display: flex; gap: 20px; align-items: center; }
    .checks label { font-size: 0.9rem; color: var(--ink); }

    .buttons { display: flex; flex-wrap: wrap; gap: 10px; margin-top: 14px; }

    button {
      appearance: none;
      border: none;
      border-radius: 8px;
      padding: 9px 18px;
      font-size: 0.92rem;
      font-weight: 600;
      cursor: pointer;
      color: #0d1310;
      background: var(--accent);
    }

    button.secondary { background: var(--accent-2); color: #0b1220; }
    button.ghost {
      background: transparent;
      color: var(--muted);
      border: 1px solid var(--panel-edge);
    }
    button.danger { background: var(--warn); color: #fff; }
    button:active { transform: scale(0.98); }

    #chart { width: 100%; height: 240px; display: block; }
    .chart-line { fill: none; stroke: var(--accent); stroke-width: 2.5; }
    .chart-point { fill: var(--panel); stroke: var(--accent); stroke-width: 2; }
    .chart-grid { stroke: rgba(139, 152, 165, 0.18); }
    .chart-label { fill: var(--muted); font-size: 11px; }

    .heatmap {
      display: grid;
      grid-auto-flow: column;
      grid-template-rows: repeat(7, 14px);
      gap: 3px;
      overflow-x: auto;
      padding-bottom: 4px;
    }

    .heatmap .cell {
      width: 14px;
      height: 14px;
      border-radius: 3px;
      background: var(--heat-0);
    }

    .cell[data-level="1"] { background: var(--heat-1); }
    .cell[data-level="2"] { background: var(--heat-2); }
    .cell[data-level="3"] { background: var(--heat-3); }
    .cell[data-level="4"] { background: var(--heat-4); }

    .status { min-height: 1.2em; font-size: 0.9rem; color: var(--muted); }
    .status[data-type="error"] { color: var(--warn); }
    .status[data-type="ok"] { color: var(--accent); }

    #migration-log {
      background: var(--bg);
      border: 1px solid var(--panel-edge);
      border-radius: 8px;
      padding: 10px 12px;
      margin: 12px 0 0;
      max-height: 220px;
      overflow-y: auto;
      font-family: "SFMono-Regular", ui-monospace, monospace;
      font-size: 0.82rem;
      white-space: pre-wrap;
      color: var(--muted);
    }

    .hint { margin: 10px 0 0; color: var(--muted); font-size: 0.82rem; }

    @media (max-width: 600px) {
      .panel { padding: 14px; }
      button { width: 100%; }
      .buttons { flex-direction: column; }
    }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Freelance Tracker</h1>
      <span class="who">{{NAME}} &middot; <span id="date">{{DATE}}</span></span>
    </header>

    <section class="cards">
      <div class="card">
        <span class="label">Today's earnings</span>
        <span class="value money" id="card-earnings">{{EARNINGS}}</span>
      </div>
      <div class="card">
        <span class="label">Hours worked</span>
        <span class="value" id="card-hours">{{HOURS}}</span>
      </div>
      <div class="card">
        <span class="label">Month to date</span>
        <span class="value money" id="card-month">--</span>
      </div>
      <div class="card">
        <span class="label">Goal progress</span>
        <span class="value" id="card-goal">--</span>
      </div>
    </section>

    <section class="panel">
      <h2>Log today</h2>
      <div class="form-grid">
        <div class="field">
          <label for="sleep-start">Slept at (hour)</label>
          <input id="sleep-start" type="number" min="0" max="23" data-field="sleep_start_time" />
        </div>
        <div class="field">
          <label for="sleep-end">Woke at (hour)</label>
          <input id="sleep-end" type="number" min="0" max="23" data-field="sleep_end_time" />
        </div>
        <div class="field">
          <label for="work-start">Work start (hour)</label>
          <input id="work-start" type="number" min="0" max="23" data-field="work_start_time" />
        </div>
        <div class="field">
          <label for="work-end">Work end (hour)</label>
          <input id="work-end" type="number" min="0" max="23" data-field="work_end_time" />
        </div>
        <div class="field">
          <label for="motivation">Motivation (0-5)</label>
          <select id="motivation" data-field="motivation_level">
            <option value="">not set</option>
            <option>0</option><option>1</option><option>2</option>
            <option>3</option><option>4</option><option>5</option>
          </select>
        </div>
        <div class="field">
          <label for="anxiety">Anxiety (0-5)</label>
          <select id="anxiety" data-field="anxiety_level">
            <option value="">not set</option>
            <option>0</option><option>1</option><option>2</option>
            <option>3</option><option>4</option><option>5</option>
          </select>
        </div>
        <div class="field">
          <label for="earnings">Earnings</label>
          <input id="earnings" type="number" min="0" step="0.01" data-field="earnings" />
        </div>
        <div class="field">
          <label for="projects">Projects (0-5)</label>
          <input id="projects" type="number" min="0" max="5" data-field="projects_count" />
        </div>
      </div>
      <div class="buttons">
        <div class="checks">
          <label><input id="workout" type="checkbox" data-field="did_workout" /> worked out</label>
          <label><input id="walk" type="checkbox" data-field="did_walk" /> took a walk</label>
        </div>
        <button id="save-btn" type="button">Save</button>
        <button id="break-btn" type="button" class="secondary">{{BREAK_LABEL}}</button>
        <button id="notify-btn" type="button" class="ghost">Enable reminders</button>
      </div>
      <div class="status" id="status"></div>
    </section>

    <section class="panel">
      <h2>Earnings, last 7 days</h2>
      <svg id="chart" viewBox="0 0 600 240" role="img" aria-label="Earnings chart"></svg>
    </section>

    <section class="panel">
      <h2>Activity, last 12 weeks</h2>
      <div class="heatmap" id="heatmap"></div>
      <p class="hint">Cell shade follows logged earnings for the day.</p>
    </section>

    <section class="panel">
      <h2>Schema migration</h2>
      <button id="migrate-btn" type="button" class="danger">Run migration</button>
      <pre id="migration-log">No migration run yet.</pre>
      <p class="hint">Reshapes legacy per-day documents into month-grouped records. Safe to re-run; output is recomputed from the legacy source.</p>
    </section>
  </main>

  <script>
    const statusEl = document.getElementById('status');
    const chartEl = document.getElementById('chart');
    const heatmapEl = document.getElementById('heatmap');
    const logEl = document.getElementById('migration-log');
    const fieldEls = Array.from(document.querySelectorAll('[data-field]'));

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const fillForm = (record) => {
      fieldEls.forEach((el) => {
        const value = record[el.dataset.field];
        if (el.type === 'checkbox') {
          el.checked = value === true;
        } else if (value !== null && value !== undefined) {
          el.value = value;
        }
      });
      document.getElementById('card-earnings').textContent =
        record.earnings == null ? '--' : record.earnings.toFixed(2);
      document.getElementById('card-hours').textContent =
        record.hours_worked == null ? '--' : record.hours_worked.toFixed(1);
      document.getElementById('break-btn').textContent =
        record.work_break.is_active ? 'Stop break' : 'Start break';
    };

    const collectPatch = () => {
      const patch = {};
      fieldEls.forEach((el) => {
        if (el.type === 'checkbox') {
          if (el.checked) patch[el.dataset.field] = true;
          return;
        }
        if (el.value === '') return;
        patch[el.dataset.field] = Number(el.value);
      });
      return patch;
    };

    const renderChart = (points) => {
      if (!points.length) {
        chartEl.innerHTML = '<text class="chart-label" x="50%" y="50%" text-anchor="middle">No data yet</text>';
        return;
      }

      const width = 600;
      const height = 240;
      const padX = 44;
      const padY = 30;
      const values = points.map((p) => p.earnings);
      let max = Math.max(...values, 1);

      const xStep = points.length > 1 ? (width - padX * 2) / (points.length - 1) : 0;
      const x = (i) => padX + i * xStep;
      const y = (v) => height - padY - (v / max) * (height - padY * 2);

      const path = points
        .map((p, i) => `${i === 0 ? 'M' : 'L'} ${x(i).toFixed(2)} ${y(p.earnings).toFixed(2)}`)
        .join(' ');

      let grid = '';
      for (let i = 0; i <= 4; i += 1) {
        const value = (max * i) / 4;
        const yPos = y(value);
        grid += `<line class="chart-grid" x1="${padX}" y1="${yPos}" x2="${width - padX}" y2="${yPos}" />`;
        grid += `<text class="chart-label" x="${padX - 8}" y="${yPos + 4}" text-anchor="end">${value.toFixed(0)}</text>`;
      }

      const labels = points
        .map((p, i) => `<text class="chart-label" x="${x(i)}" y="${height - padY + 16}" text-anchor="middle">${p.date.slice(5)}</text>`)
        .join('');
      const circles = points
        .map((p, i) => `<circle class="chart-point" cx="${x(i)}" cy="${y(p.earnings)}" r="4" />`)
        .join('');

      chartEl.innerHTML = `${grid}<path class="chart-line" d="${path}" />${circles}${labels}`;
    };

    const renderHeatmap = (cells) => {
      heatmapEl.innerHTML = cells
        .map((c) => `<div class="cell" data-level="${c.level}" title="${c.date}: ${c.earnings.toFixed(2)}"></div>`)
        .join('');
    };

    const renderSummary = (summary) => {
      document.getElementById('card-month').textContent = summary.total_earnings.toFixed(2);
      const goalEl = document.getElementById('card-goal');
      goalEl.textContent = summary.goal_progress == null
        ? '--'
        : `${Math.round(summary.goal_progress * 100)}%`;
    };

    const loadDay = async () => {
      const res = await fetch('/api/day');
      if (!res.ok) throw new Error('Unable to load today');
      const payload = await res.json();
      fillForm(payload.record);
    };

    const loadStats = async () => {
      const res = await fetch('/api/stats');
      if (!res.ok) throw new Error('Unable to load stats');
      const stats = await res.json();
      renderChart(stats.last_7_days);
      renderHeatmap(stats.heatmap);
      renderSummary(stats.month_summary);
    };

    const save = async () => {
      setStatus('Saving...', '');
      const res = await fetch('/api/day', {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify(collectPatch())
      });
      if (!res.ok) throw new Error(await res.text() || 'Save failed');
      fillForm((await res.json()).record);
      await loadStats();
      setStatus('Saved', 'ok');
      setTimeout(() => setStatus('', ''), 1200);
    };

    const toggleBreak = async () => {
      const action = document.getElementById('break-btn').textContent.startsWith('Stop')
        ? 'stop' : 'start';
      const res = await fetch('/api/break', {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify({ action })
      });
      if (!res.ok) throw new Error(await res.text() || 'Break update failed');
      fillForm((await res.json()).record);
    };

    const enableReminders = async () => {
      let decision = 'default';
      if ('Notification' in window) {
        decision = await Notification.requestPermission();
      }
      await fetch('/api/notifications/permission', {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify({ decision })
      });
      setStatus(decision === 'granted' ? 'Reminders on' : 'Reminders off', 'ok');
    };

    const pollNotifications = async () => {
      try {
        const res = await fetch('/api/notifications');
        if (!res.ok) return;
        const payload = await res.json();
        payload.notifications.forEach((n) => {
          if ('Notification' in window && Notification.permission === 'granted') {
            new Notification(n.title, { body: n.body });
          }
        });
      } catch (_) {
        // Polling failures are silent; the next tick retries.
      }
    };

    const runMigration = async () => {
      if (!window.confirm('Run the legacy schema migration now?')) return;
      logEl.textContent = 'Running...';
      const res = await fetch('/api/migrate', { method: 'POST' });
      if (!res.ok) {
        logEl.textContent = `Migration request failed: ${await res.text()}`;
        return;
      }
      const payload = await res.json();
      logEl.textContent = payload.lines.join('\n');
      logEl.scrollTop = logEl.scrollHeight;
    };

    document.getElementById('save-btn').addEventListener('click', () => {
      save().catch((err) => setStatus(err.message, 'error'));
    });
    document.getElementById('break-btn').addEventListener('click', () => {
      toggleBreak().catch((err) => setStatus(err.message, 'error'));
    });
    document.getElementById('notify-btn').addEventListener('click', () => {
      enableReminders().catch((err) => setStatus(err.message, 'error'));
    });
    document.getElementById('migrate-btn').addEventListener('click', () => {
      runMigration().catch((err) => setStatus(err.message, 'error'));
    });

    loadDay().catch((err) => setStatus(err.message, 'error'));
    loadStats().catch((err) => setStatus(err.message, 'error'));
    setInterval(pollNotifications, 30000);
  </script>
</body>
</html>
"#;
