use crate::models::{ActivityDraft, Category};

pub fn render_index(dark_mode: bool, draft: &ActivityDraft) -> String {
    INDEX_HTML
        .replace("{{THEME}}", if dark_mode { "dark-mode" } else { "" })
        .replace("{{THEME_ICON}}", if dark_mode { "&#127769;" } else { "&#9728;&#65039;" })
        .replace("{{NAME}}", &escape_html(&draft.name))
        .replace("{{CATEGORY_OPTIONS}}", &category_options(&draft.category))
        .replace("{{CARBON}}", &escape_html(&draft.carbon_value))
}

fn category_options(selected: &str) -> String {
    let mut options = String::from(r#"<option value="">Select a category</option>"#);
    for category in Category::KNOWN {
        let label = escape_html(category.label());
        let marker = if category.label() == selected { " selected" } else { "" };
        options.push_str(&format!(r#"<option value="{label}"{marker}>{label}</option>"#));
    }
    options
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

const INDEX_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  <title>Carbon Footprint Tracker</title>
  <style>
    :root {
      --bg: #f3f7f1;
      --card: #ffffff;
      --ink: #24302a;
      --muted: #6b776f;
      --accent: #63d369;
      --border: rgba(36, 48, 42, 0.1);
      --scale-1: #d6f5d6;
      --scale-2: #a8e6a1;
      --scale-3: #f7d774;
      --scale-4: #f59e4c;
      --scale-5: #d64545;
    }

    .dark-mode {
      --bg: #141a17;
      --card: #1f2823;
      --ink: #e7efe9;
      --muted: #9aa89f;
      --border: rgba(231, 239, 233, 0.12);
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      font-family: "Trebuchet MS", sans-serif;
    }

    .main-container {
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      padding: 28px 18px 48px;
    }

    .main-header {
      display: flex;
      align-items: center;
      justify-content: space-between;
      max-width: 1100px;
      margin: 0 auto 24px;
    }

    h1 {
      margin: 0;
      font-size: clamp(1.7rem, 4vw, 2.4rem);
    }

    .dark-mode-toggle {
      border: 1px solid var(--border);
      background: var(--card);
      border-radius: 999px;
      font-size: 1.3rem;
      padding: 6px 12px;
      cursor: pointer;
    }

    .content-grid {
      display: grid;
      gap: 20px;
      max-width: 1100px;
      margin: 0 auto;
      grid-template-columns: repeat(auto-fit, minmax(320px, 1fr));
    }

    .card {
      background: var(--card);
      border: 1px solid var(--border);
      border-radius: 18px;
      padding: 20px;
    }

    .card.wide {
      grid-column: 1 / -1;
    }

    h2 {
      margin: 0 0 12px;
      font-size: 1.25rem;
    }

    .hint {
      color: var(--muted);
      font-size: 0.9rem;
      margin: 0 0 12px;
    }

    .form-group {
      display: grid;
      gap: 6px;
      margin-bottom: 14px;
    }

    input, select {
      padding: 10px 12px;
      border-radius: 10px;
      border: 1px solid var(--border);
      background: var(--bg);
      color: var(--ink);
      font-size: 1rem;
    }

    .submit-btn {
      border: none;
      border-radius: 999px;
      padding: 12px 20px;
      background: var(--accent);
      color: #10301a;
      font-weight: 600;
      font-size: 1rem;
      cursor: pointer;
    }

    .field-error {
      color: #d64545;
      font-size: 0.85rem;
      min-height: 1em;
    }

    svg {
      width: 100%;
      display: block;
    }

    svg text {
      fill: var(--muted);
      font-size: 11px;
    }

    .chart-line {
      fill: none;
      stroke: var(--accent);
      stroke-width: 2;
    }

    .chart-point {
      fill: var(--card);
      stroke: var(--accent);
      stroke-width: 2;
    }

    .chart-grid {
      stroke: var(--border);
      stroke-dasharray: 3 3;
    }

    .legend {
      display: flex;
      flex-wrap: wrap;
      gap: 10px;
      font-size: 0.85rem;
    }

    .legend span::before {
      content: "";
      display: inline-block;
      width: 10px;
      height: 10px;
      border-radius: 3px;
      margin-right: 5px;
      background: var(--swatch);
    }

    .color-empty { fill: var(--border); }
    .color-scale-1 { fill: var(--scale-1); }
    .color-scale-2 { fill: var(--scale-2); }
    .color-scale-3 { fill: var(--scale-3); }
    .color-scale-4 { fill: var(--scale-4); }
    .color-scale-5 { fill: var(--scale-5); }

    .color-filled {
      cursor: pointer;
    }

    .day-details {
      margin-top: 14px;
      padding: 14px;
      border-radius: 12px;
      border: 1px solid var(--border);
    }

    .day-details[hidden] {
      display: none;
    }

    .status {
      max-width: 1100px;
      margin: 16px auto 0;
      min-height: 1.2em;
      color: var(--muted);
    }

    .status[data-type="error"] {
      color: #d64545;
    }

    .status[data-type="ok"] {
      color: #2d7a4b;
    }
  </style>
</head>
<body>
  <div class="main-container {{THEME}}" id="main">
    <header class="main-header">
      <h1>Carbon Footprint Tracker</h1>
      <button class="dark-mode-toggle" id="theme-toggle" type="button" aria-label="Toggle dark mode">{{THEME_ICON}}</button>
    </header>

    <div class="content-grid">
      <section class="card wide">
        <h2>Summary</h2>
        <p class="hint">Emissions by day (kg CO&#8322;).</p>
        <svg id="line-chart" viewBox="0 0 720 260" role="img" aria-label="Emissions by day"></svg>
      </section>

      <section class="card">
        <h2>Emissions Breakdown</h2>
        <p class="hint">Inner ring: today's breakdown. Outer ring: all time breakdown.</p>
        <svg id="pie-chart" viewBox="0 0 400 400" role="img" aria-label="Category breakdown"></svg>
        <div class="legend" id="pie-legend"></div>
      </section>

      <section class="card">
        <h2>Add New Activity</h2>
        <form id="activity-form" method="post" action="/activities">
          <div class="form-group">
            <label for="name">Activity Name:</label>
            <input type="text" id="name" name="name" value="{{NAME}}" placeholder="e.g. Daily commute" required />
            <span class="field-error" data-field="name"></span>
          </div>
          <div class="form-group">
            <label for="category">Category:</label>
            <select id="category" name="category" required>{{CATEGORY_OPTIONS}}</select>
            <span class="field-error" data-field="category"></span>
          </div>
          <div class="form-group">
            <label for="carbonValue">Carbon Value (kg CO&#8322;):</label>
            <input type="number" id="carbonValue" name="carbonValue" value="{{CARBON}}" placeholder="e.g. 2.5" min="0" step="0.1" required />
            <span class="field-error" data-field="carbonValue"></span>
          </div>
          <button type="submit" class="submit-btn">Save Activity</button>
        </form>
      </section>

      <section class="card wide">
        <h2>Daily Carbon Footprint</h2>
        <p class="hint" id="heatmap-range">Past year.</p>
        <svg id="heatmap" viewBox="0 0 760 120" role="img" aria-label="Daily heatmap"></svg>
        <div class="day-details" id="day-details" hidden></div>
      </section>
    </div>

    <div class="status" id="status"></div>
  </div>

  <script>
    const TODAY_COLORS = ['#1F77B4', '#2CA02C', '#D62728', '#9467BD', '#8C564B', '#E377C2'];
    const ALL_TIME_COLORS = ['#FF7F0E', '#17BECF', '#BCBD22', '#7F7F7F', '#AEC7E8', '#98DF8A'];
    const SVG_NS = 'http://www.w3.org/2000/svg';

    const mainEl = document.getElementById('main');
    const statusEl = document.getElementById('status');
    const formEl = document.getElementById('activity-form');
    const lineEl = document.getElementById('line-chart');
    const pieEl = document.getElementById('pie-chart');
    const legendEl = document.getElementById('pie-legend');
    const heatmapEl = document.getElementById('heatmap');
    const rangeEl = document.getElementById('heatmap-range');
    const detailsEl = document.getElementById('day-details');

    const escapeText = (value) =>
      String(value).replace(/[&<>"']/g, (ch) => ({ '&': '&amp;', '<': '&lt;', '>': '&gt;', '"': '&quot;', "'": '&#39;' }[ch]));

    const setStatus = (message, type) => {
      statusEl.textContent = message;
      statusEl.dataset.type = type || '';
    };

    const getJson = async (url) => {
      const res = await fetch(url);
      if (!res.ok) {
        throw new Error(`Unable to load ${url}`);
      }
      return res.json();
    };

    const renderLineChart = (points) => {
      if (!points.length) {
        lineEl.innerHTML = '<text x="50%" y="50%" text-anchor="middle">No data yet</text>';
        return;
      }
      const width = 720;
      const height = 260;
      const padX = 48;
      const padY = 34;
      const top = 20;
      const max = Math.max(...points.map((p) => p.carbon_value), 1);
      const xStep = points.length > 1 ? (width - padX * 2) / (points.length - 1) : 0;
      const x = (i) => padX + i * xStep;
      const y = (v) => height - padY - (v / max) * (height - top - padY);

      let grid = '';
      for (let i = 0; i <= 4; i += 1) {
        const value = (max * i) / 4;
        grid += `<line class="chart-grid" x1="${padX}" y1="${y(value)}" x2="${width - padX}" y2="${y(value)}" />`;
        grid += `<text x="${padX - 8}" y="${y(value) + 4}" text-anchor="end">${Math.round(value * 10) / 10}</text>`;
      }
      const path = points.map((p, i) => `${i === 0 ? 'M' : 'L'} ${x(i).toFixed(2)} ${y(p.carbon_value).toFixed(2)}`).join(' ');
      const dots = points
        .map((p, i) => `<circle class="chart-point" cx="${x(i)}" cy="${y(p.carbon_value)}" r="4"><title>${escapeText(p.date)}: ${p.carbon_value} kg CO₂</title></circle>`)
        .join('');
      const labels = points
        .map((p, i) => `<text x="${x(i)}" y="${height - padY + 18}" text-anchor="middle">${escapeText(p.date)}</text>`)
        .join('');
      lineEl.innerHTML = `${grid}<path class="chart-line" d="${path}" />${dots}${labels}`;
    };

    const ring = (items, colors, inner, outer, prefix) => {
      const total = items.reduce((acc, item) => acc + item.value, 0);
      if (total <= 0) {
        return '';
      }
      let angle = -Math.PI / 2;
      return items
        .map((item, i) => {
          const sweep = (item.value / total) * Math.PI * 2;
          const end = angle + Math.min(sweep, Math.PI * 2 - 1e-6);
          const large = sweep > Math.PI ? 1 : 0;
          const p = (r, a) => `${200 + r * Math.cos(a)} ${200 + r * Math.sin(a)}`;
          const d = `M ${p(outer, angle)} A ${outer} ${outer} 0 ${large} 1 ${p(outer, end)} L ${p(inner, end)} A ${inner} ${inner} 0 ${large} 0 ${p(inner, angle)} Z`;
          angle += sweep;
          return `<path d="${d}" fill="${colors[i % colors.length]}"><title>${prefix}${escapeText(item.name)}: ${item.value} kg CO₂</title></path>`;
        })
        .join('');
    };

    const renderPie = (overview) => {
      pieEl.innerHTML = ring(overview.today, TODAY_COLORS, 50, 100, 'Today · ') + ring(overview.all_time, ALL_TIME_COLORS, 110, 150, 'All time · ');
      if (!overview.all_time.length) {
        pieEl.innerHTML = '<text x="50%" y="50%" text-anchor="middle">No data yet</text>';
      }
      const swatches = (items, colors, prefix) =>
        items.map((item, i) => `<span style="--swatch:${colors[i % colors.length]}">${prefix}${escapeText(item.name)}</span>`).join('');
      legendEl.innerHTML = swatches(overview.today, TODAY_COLORS, 'Today: ') + swatches(overview.all_time, ALL_TIME_COLORS, '');
    };

    const renderHeatmap = (data) => {
      const cell = 13;
      const gap = 2;
      const left = 28;
      const topPad = 4;
      const start = new Date(`${data.start_date}T00:00:00`);
      const end = new Date(`${data.end_date}T00:00:00`);
      const byDate = new Map(data.days.map((day) => [day.date, day]));
      const firstSunday = new Date(start);
      firstSunday.setDate(start.getDate() - start.getDay());

      let cells = '';
      const weekdays = ['', 'Mon', '', 'Wed', '', 'Fri', ''];
      weekdays.forEach((label, i) => {
        if (label) {
          cells += `<text x="0" y="${topPad + i * (cell + gap) + 10}">${label}</text>`;
        }
      });
      for (let day = new Date(start); day <= end; day.setDate(day.getDate() + 1)) {
        const key = `${day.getFullYear()}-${String(day.getMonth() + 1).padStart(2, '0')}-${String(day.getDate()).padStart(2, '0')}`;
        const week = Math.floor((day - firstSunday) / (7 * 86400000));
        const value = byDate.get(key);
        const cls = value ? `color-filled color-scale-${value.color_index}` : 'color-empty';
        const title = value ? `${key}: ${value.count} kg CO₂` : key;
        cells += `<rect class="${cls}" data-date="${key}" x="${left + week * (cell + gap)}" y="${topPad + day.getDay() * (cell + gap)}" width="${cell}" height="${cell}" rx="2"><title>${title}</title></rect>`;
      }
      heatmapEl.innerHTML = cells;
      rangeEl.textContent = `${data.start_date} to ${data.end_date}`;
    };

    const showDay = async (date) => {
      const res = await fetch(`/api/days/${date}`);
      if (!res.ok) {
        detailsEl.hidden = true;
        return;
      }
      const day = await res.json();
      const items = day.activities
        .map((a) => `<li>${escapeText(a.name)} (${escapeText(a.category)}): ${a.carbonValue} kg</li>`)
        .join('');
      const label = new Date(`${day.date}T00:00:00`).toLocaleDateString(undefined, { month: 'long', day: 'numeric', year: 'numeric' });
      detailsEl.innerHTML = `<h4>${label}</h4><p>Total: ${day.count} kg CO₂</p><ul>${items}</ul><button type="button" id="close-day">Close</button>`;
      detailsEl.hidden = false;
      document.getElementById('close-day').addEventListener('click', () => {
        detailsEl.hidden = true;
      });
    };

    const refresh = async () => {
      const [series, overview, heatmap] = await Promise.all([
        getJson('/api/series'),
        getJson('/api/breakdown/category'),
        getJson('/api/breakdown/day')
      ]);
      renderLineChart(series);
      renderPie(overview);
      renderHeatmap(heatmap);
    };

    const readDraft = () => ({
      name: formEl.elements.name.value,
      category: formEl.elements.category.value,
      carbonValue: formEl.elements.carbonValue.value
    });

    const showFieldErrors = (fields) => {
      document.querySelectorAll('.field-error').forEach((el) => {
        const match = fields.find((f) => f.field === el.dataset.field);
        el.textContent = match ? match.message : '';
      });
    };

    let draftTimer = null;
    formEl.addEventListener('input', () => {
      clearTimeout(draftTimer);
      draftTimer = setTimeout(() => {
        fetch('/api/draft', {
          method: 'PUT',
          headers: { 'content-type': 'application/json' },
          body: JSON.stringify(readDraft())
        }).catch((err) => setStatus(err.message, 'error'));
      }, 250);
    });

    formEl.addEventListener('submit', async (event) => {
      event.preventDefault();
      clearTimeout(draftTimer);
      const res = await fetch('/api/activities', {
        method: 'POST',
        headers: { 'content-type': 'application/json' },
        body: JSON.stringify(readDraft())
      });
      if (res.status === 400) {
        const body = await res.json().catch(() => ({ error: 'Please fill in all fields', fields: [] }));
        showFieldErrors(body.fields || []);
        setStatus(body.error, 'error');
        return;
      }
      if (!res.ok) {
        setStatus(await res.text(), 'error');
        return;
      }
      formEl.reset();
      formEl.elements.name.value = '';
      formEl.elements.carbonValue.value = '';
      formEl.elements.category.value = '';
      showFieldErrors([]);
      setStatus('Activity saved successfully!', 'ok');
      setTimeout(() => setStatus('', ''), 1500);
    });

    heatmapEl.addEventListener('click', (event) => {
      const date = event.target.dataset && event.target.dataset.date;
      if (date && event.target.classList.contains('color-filled')) {
        showDay(date).catch((err) => setStatus(err.message, 'error'));
      } else {
        detailsEl.hidden = true;
      }
    });

    document.getElementById('theme-toggle').addEventListener('click', async (event) => {
      const res = await fetch('/api/preferences/dark-mode/toggle', { method: 'POST' });
      if (!res.ok) {
        setStatus('Unable to save preference', 'error');
        return;
      }
      const prefs = await res.json();
      mainEl.classList.toggle('dark-mode', prefs.dark_mode);
      event.target.textContent = prefs.dark_mode ? '\u{1F319}' : '☀️';
    });

    const events = new EventSource('/api/events');
    events.addEventListener('activityUpdated', () => {
      refresh().catch((err) => setStatus(err.message, 'error'));
    });

    refresh().catch((err) => setStatus(err.message, 'error'));
  </script>
</body>
</html>
"##;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_values_are_escaped() {
        let draft = ActivityDraft {
            name: r#"<script>"x"</script>"#.into(),
            category: String::new(),
            carbon_value: "2.5".into(),
        };
        let html = render_index(false, &draft);
        assert!(html.contains("&lt;script&gt;&quot;x&quot;&lt;/script&gt;"));
        assert!(!html.contains(r#"value="<script>"#));
        assert!(html.contains(r#"value="2.5""#));
    }

    #[test]
    fn saved_category_is_preselected() {
        let draft = ActivityDraft {
            category: "Waste & Sustainability Actions".into(),
            ..ActivityDraft::default()
        };
        let html = render_index(true, &draft);
        assert!(html.contains(
            r#"<option value="Waste &amp; Sustainability Actions" selected>"#
        ));
        assert!(html.contains(r#"class="main-container dark-mode""#));
    }
}
